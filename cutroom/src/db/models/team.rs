//! Database models for team members.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::MediaUpdate;
use crate::storage::MediaField;
use crate::storage::cleanup::{StoredMedia, StoredRef};
use crate::types::TeamMemberId;

#[derive(Debug, Clone)]
pub struct TeamMemberCreateDBRequest {
    pub name: String,
    pub position: String,
    pub bio: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub image: MediaUpdate,
}

#[derive(Debug, Clone, Default)]
pub struct TeamMemberUpdateDBRequest {
    pub name: Option<String>,
    pub position: Option<String>,
    pub bio: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    pub image: Option<MediaUpdate>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TeamMemberDBResponse {
    pub id: TeamMemberId,
    pub name: String,
    pub position: String,
    pub bio: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub image_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredMedia for TeamMemberDBResponse {
    fn stored_media(&self) -> Vec<StoredRef<'_>> {
        vec![StoredRef::new(MediaField::Image, &self.image_url, &self.image_key)]
    }
}
