//! API request/response models for portfolio items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::media::{ensure_valid, media_for_create, media_for_update, slugify, validate_slug};
use super::pagination::Pagination;
use crate::api::extract::MediaForm;
use crate::db::models::portfolio::{PortfolioCreateDBRequest, PortfolioItemDBResponse, PortfolioUpdateDBRequest};
use crate::errors::{Error, FieldError, Result};
use crate::storage::signing::MediaSlot;
use crate::storage::{MediaField, Signable, UploadFolder};
use crate::types::PortfolioItemId;

fn default_true() -> bool {
    true
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioCreate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title is required (at most 200 characters)"))]
    pub title: String,
    /// Derived from the title when omitted
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 200))]
    pub client: Option<String>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub featured: bool,
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

impl MediaForm for PortfolioCreate {
    const UPLOADS: &'static [(MediaField, UploadFolder)] =
        &[(MediaField::Video, UploadFolder::Portfolio), (MediaField::Thumbnail, UploadFolder::Thumbnails)];
}

impl TryFrom<PortfolioCreate> for PortfolioCreateDBRequest {
    type Error = Error;

    fn try_from(request: PortfolioCreate) -> Result<Self> {
        let mut fields = Vec::new();
        let video = media_for_create(MediaField::Video, request.video_url, request.video_key, &mut fields);
        let thumbnail = media_for_create(MediaField::Thumbnail, request.thumbnail_url, request.thumbnail_key, &mut fields);

        let slug = request.slug.unwrap_or_else(|| slugify(&request.title));
        if validate_slug(&slug).is_err() {
            fields.push(FieldError::new("slug", "slug could not be derived from the title"));
        }
        ensure_valid(fields)?;

        Ok(Self {
            title: request.title,
            slug,
            description: request.description,
            category: request.category,
            client: request.client,
            featured: request.featured,
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
pub struct PortfolioUpdate {
    #[validate(length(min = 1, max = 200, message = "title must not be empty (at most 200 characters)"))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 200))]
    pub client: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub featured: Option<bool>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub sort_order: Option<i32>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub is_active: Option<bool>,
    /// `null` removes the video
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub video_url: Option<Option<String>>,
    pub video_key: Option<String>,
    /// `null` removes the thumbnail
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub thumbnail_url: Option<Option<String>>,
    pub thumbnail_key: Option<String>,
}

impl MediaForm for PortfolioUpdate {
    const UPLOADS: &'static [(MediaField, UploadFolder)] = PortfolioCreate::UPLOADS;
}

impl TryFrom<PortfolioUpdate> for PortfolioUpdateDBRequest {
    type Error = Error;

    fn try_from(request: PortfolioUpdate) -> Result<Self> {
        let mut fields = Vec::new();
        let video = media_for_update(MediaField::Video, request.video_url, request.video_key, &mut fields);
        let thumbnail = media_for_update(MediaField::Thumbnail, request.thumbnail_url, request.thumbnail_key, &mut fields);
        ensure_valid(fields)?;

        Ok(Self {
            title: request.title,
            slug: request.slug,
            description: request.description,
            category: request.category,
            client: request.client,
            featured: request.featured,
            sort_order: request.sort_order,
            is_active: request.is_active,
            video,
            thumbnail,
        })
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListPortfolioQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only items in this category
    pub category: Option<String>,

    /// Only featured (or only non-featured) items
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItemResponse {
    #[schema(value_type = String, format = "uuid")]
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

impl From<PortfolioItemDBResponse> for PortfolioItemResponse {
    fn from(db: PortfolioItemDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            slug: db.slug,
            description: db.description,
            category: db.category,
            client: db.client,
            featured: db.featured,
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

impl Signable for PortfolioItemResponse {
    fn media_slots(&mut self) -> Vec<MediaSlot<'_>> {
        vec![
            MediaSlot::new(MediaField::Video, &mut self.video_url, &self.video_key),
            MediaSlot::new(MediaField::Thumbnail, &mut self.thumbnail_url, &self.thumbnail_key),
        ]
    }
}
