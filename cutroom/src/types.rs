//! Common type definitions.
//!
//! All entity IDs are UUIDs behind type aliases so signatures say which table they refer to.

use serde::Deserialize;
use uuid::Uuid;

pub type UserId = Uuid;
pub type PortfolioItemId = Uuid;
pub type ShowreelId = Uuid;
pub type ReelId = Uuid;
pub type TeamMemberId = Uuid;
pub type JobId = Uuid;
pub type ApplicationId = Uuid;
pub type ContactSubmissionId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Path parameter accepting either a record's UUID or its slug, so public pages can use
/// readable URLs (`/api/jobs/senior-colorist`) while the admin UI keeps using ids.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdOrSlug {
    Id(Uuid),
    Slug(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }

    #[test]
    fn test_id_or_slug() {
        let id: IdOrSlug = serde_json::from_str("\"550e8400-e29b-41d4-a716-446655440000\"").unwrap();
        assert!(matches!(id, IdOrSlug::Id(_)));

        let slug: IdOrSlug = serde_json::from_str("\"brand-film-2024\"").unwrap();
        assert_eq!(slug, IdOrSlug::Slug("brand-film-2024".to_string()));
    }
}
