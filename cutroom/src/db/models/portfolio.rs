//! Database models for portfolio items.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::MediaUpdate;
use crate::storage::MediaField;
use crate::storage::cleanup::{StoredMedia, StoredRef};
use crate::types::PortfolioItemId;

#[derive(Debug, Clone)]
pub struct PortfolioCreateDBRequest {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub client: Option<String>,
    pub featured: bool,
    pub sort_order: i32,
    pub is_active: bool,
    pub video: MediaUpdate,
    pub thumbnail: MediaUpdate,
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioUpdateDBRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub client: Option<String>,
    pub featured: Option<bool>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    pub video: Option<MediaUpdate>,
    pub thumbnail: Option<MediaUpdate>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PortfolioItemDBResponse {
    pub id: PortfolioItemId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub client: Option<String>,
    pub featured: bool,
    pub sort_order: i32,
    pub is_active: bool,
    pub video_url: Option<String>,
    pub video_key: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredMedia for PortfolioItemDBResponse {
    fn stored_media(&self) -> Vec<StoredRef<'_>> {
        vec![
            StoredRef::new(MediaField::Video, &self.video_url, &self.video_key),
            StoredRef::new(MediaField::Thumbnail, &self.thumbnail_url, &self.thumbnail_key),
        ]
    }
}
