//! Database models for the about-page video. There is at most one row.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::MediaUpdate;
use crate::storage::MediaField;
use crate::storage::cleanup::{StoredMedia, StoredRef};

/// Replace the about video. Media left as `None` keeps whatever is stored.
#[derive(Debug, Clone)]
pub struct AboutVideoUpsertDBRequest {
    pub title: String,
    pub description: Option<String>,
    pub video: Option<MediaUpdate>,
    pub thumbnail: Option<MediaUpdate>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AboutVideoDBResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub video_key: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredMedia for AboutVideoDBResponse {
    fn stored_media(&self) -> Vec<StoredRef<'_>> {
        vec![
            StoredRef::new(MediaField::Video, &self.video_url, &self.video_key),
            StoredRef::new(MediaField::Thumbnail, &self.thumbnail_url, &self.thumbnail_key),
        ]
    }
}
