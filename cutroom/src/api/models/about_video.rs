//! API request/response models for the about-page video.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::media::{ensure_valid, media_for_update};
use crate::api::extract::MediaForm;
use crate::db::models::about_video::{AboutVideoDBResponse, AboutVideoUpsertDBRequest};
use crate::errors::{Error, Result};
use crate::storage::signing::MediaSlot;
use crate::storage::{MediaField, Signable, UploadFolder};

/// Replace the about video. Text fields are overwritten; media left out is kept.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AboutVideoUpsert {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title is required (at most 200 characters)"))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub video_url: Option<Option<String>>,
    pub video_key: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub thumbnail_url: Option<Option<String>>,
    pub thumbnail_key: Option<String>,
}

impl MediaForm for AboutVideoUpsert {
    const UPLOADS: &'static [(MediaField, UploadFolder)] =
        &[(MediaField::Video, UploadFolder::AboutVideo), (MediaField::Thumbnail, UploadFolder::Thumbnails)];
}

impl TryFrom<AboutVideoUpsert> for AboutVideoUpsertDBRequest {
    type Error = Error;

    fn try_from(request: AboutVideoUpsert) -> Result<Self> {
        let mut fields = Vec::new();
        let video = media_for_update(MediaField::Video, request.video_url, request.video_key, &mut fields);
        let thumbnail = media_for_update(MediaField::Thumbnail, request.thumbnail_url, request.thumbnail_key, &mut fields);
        ensure_valid(fields)?;

        Ok(Self {
            title: request.title,
            description: request.description,
            video,
            thumbnail,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AboutVideoResponse {
    #[schema(value_type = String, format = "uuid")]
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

impl From<AboutVideoDBResponse> for AboutVideoResponse {
    fn from(db: AboutVideoDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            video_url: db.video_url,
            video_key: db.video_key,
            thumbnail_url: db.thumbnail_url,
            thumbnail_key: db.thumbnail_key,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl Signable for AboutVideoResponse {
    fn media_slots(&mut self) -> Vec<MediaSlot<'_>> {
        vec![
            MediaSlot::new(MediaField::Video, &mut self.video_url, &self.video_key),
            MediaSlot::new(MediaField::Thumbnail, &mut self.thumbnail_url, &self.thumbnail_key),
        ]
    }
}
