//! Database record structures.
//!
//! Each submodule holds the request types a repository accepts and the row type it returns.
//! Row types derive [`sqlx::FromRow`] and, when they carry media, implement
//! [`StoredMedia`](crate::storage::cleanup::StoredMedia) so the cleanup logic can see which
//! objects they own.

pub mod about_video;
pub mod applications;
pub mod contacts;
pub mod jobs;
pub mod portfolio;
pub mod reels;
pub mod showreels;
pub mod team;
pub mod users;

/// New value for a url/key column pair.
///
/// On update requests the pair is wrapped in an `Option`: `None` leaves the columns as they
/// are, `Some(MediaUpdate::clear())` nulls both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaUpdate {
    pub url: Option<String>,
    pub key: Option<String>,
}

impl MediaUpdate {
    pub fn set(url: impl Into<String>, key: Option<String>) -> Self {
        Self {
            url: Some(url.into()),
            key,
        }
    }

    pub fn clear() -> Self {
        Self::default()
    }
}

/// Bind parameters for an optional media change: (apply?, url, key).
pub(crate) fn media_binds(update: &Option<MediaUpdate>) -> (bool, Option<&str>, Option<&str>) {
    match update {
        Some(m) => (true, m.url.as_deref(), m.key.as_deref()),
        None => (false, None, None),
    }
}
