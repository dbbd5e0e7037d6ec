//! API request/response models for short-form reels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use utoipa::ToSchema;
use validator::Validate;

use super::media::{ensure_valid, media_for_create, media_for_update};
use crate::api::extract::MediaForm;
use crate::db::models::reels::{ReelCreateDBRequest, ReelDBResponse, ReelUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::storage::signing::MediaSlot;
use crate::storage::{MediaField, Signable, UploadFolder};
use crate::types::ReelId;

fn default_true() -> bool {
    true
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReelCreate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title is required (at most 200 characters)"))]
    pub title: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub sort_order: i32,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub video_url: Option<String>,
    pub video_key: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_key: Option<String>,
}

impl MediaForm for ReelCreate {
    const UPLOADS: &'static [(MediaField, UploadFolder)] =
        &[(MediaField::Video, UploadFolder::Reels), (MediaField::Thumbnail, UploadFolder::Thumbnails)];
}

impl TryFrom<ReelCreate> for ReelCreateDBRequest {
    type Error = Error;

    fn try_from(request: ReelCreate) -> Result<Self> {
        let mut fields = Vec::new();
        let video = media_for_create(MediaField::Video, request.video_url, request.video_key, &mut fields);
        let thumbnail = media_for_create(MediaField::Thumbnail, request.thumbnail_url, request.thumbnail_key, &mut fields);
        ensure_valid(fields)?;

        Ok(Self {
            title: request.title,
            sort_order: request.sort_order,
            is_active: request.is_active,
            video,
            thumbnail,
        })
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReelUpdate {
    #[validate(length(min = 1, max = 200, message = "title must not be empty (at most 200 characters)"))]
    pub title: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub sort_order: Option<i32>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub is_active: Option<bool>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub video_url: Option<Option<String>>,
    pub video_key: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub thumbnail_url: Option<Option<String>>,
    pub thumbnail_key: Option<String>,
}

impl MediaForm for ReelUpdate {
    const UPLOADS: &'static [(MediaField, UploadFolder)] = ReelCreate::UPLOADS;
}

impl TryFrom<ReelUpdate> for ReelUpdateDBRequest {
    type Error = Error;

    fn try_from(request: ReelUpdate) -> Result<Self> {
        let mut fields = Vec::new();
        let video = media_for_update(MediaField::Video, request.video_url, request.video_key, &mut fields);
        let thumbnail = media_for_update(MediaField::Thumbnail, request.thumbnail_url, request.thumbnail_key, &mut fields);
        ensure_valid(fields)?;

        Ok(Self {
            title: request.title,
            sort_order: request.sort_order,
            is_active: request.is_active,
            video,
            thumbnail,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReelResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReelId,
    pub title: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub video_url: Option<String>,
    pub video_key: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReelDBResponse> for ReelResponse {
    fn from(db: ReelDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            sort_order: db.sort_order,
            is_active: db.is_active,
            video_url: db.video_url,
            video_key: db.video_key,
            thumbnail_url: db.thumbnail_url,
            thumbnail_key: db.thumbnail_key,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl Signable for ReelResponse {
    fn media_slots(&mut self) -> Vec<MediaSlot<'_>> {
        vec![
            MediaSlot::new(MediaField::Video, &mut self.video_url, &self.video_key),
            MediaSlot::new(MediaField::Thumbnail, &mut self.thumbnail_url, &self.thumbnail_key),
        ]
    }
}
