//! Database models for showreels.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::MediaUpdate;
use crate::storage::MediaField;
use crate::storage::cleanup::{StoredMedia, StoredRef};
use crate::types::ShowreelId;

#[derive(Debug, Clone)]
pub struct ShowreelCreateDBRequest {
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub video: MediaUpdate,
    pub thumbnail: MediaUpdate,
}

#[derive(Debug, Clone, Default)]
pub struct ShowreelUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub video: Option<MediaUpdate>,
    pub thumbnail: Option<MediaUpdate>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ShowreelDBResponse {
    pub id: ShowreelId,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub video_url: Option<String>,
    pub video_key: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredMedia for ShowreelDBResponse {
    fn stored_media(&self) -> Vec<StoredRef<'_>> {
        vec![
            StoredRef::new(MediaField::Video, &self.video_url, &self.video_key),
            StoredRef::new(MediaField::Thumbnail, &self.thumbnail_url, &self.thumbnail_key),
        ]
    }
}
