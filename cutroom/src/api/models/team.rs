//! API request/response models for team members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use utoipa::ToSchema;
use validator::Validate;

use super::media::{ensure_valid, media_for_create, media_for_update};
use crate::api::extract::MediaForm;
use crate::db::models::team::{TeamMemberCreateDBRequest, TeamMemberDBResponse, TeamMemberUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::storage::signing::MediaSlot;
use crate::storage::{MediaField, Signable, UploadFolder};
use crate::types::TeamMemberId;

fn default_true() -> bool {
    true
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberCreate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "name is required (at most 200 characters)"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "position is required (at most 200 characters)"))]
    pub position: String,
    pub bio: Option<String>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub sort_order: i32,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub image_url: Option<String>,
    pub image_key: Option<String>,
}

impl MediaForm for TeamMemberCreate {
    const UPLOADS: &'static [(MediaField, UploadFolder)] = &[(MediaField::Image, UploadFolder::Team)];
}

impl TryFrom<TeamMemberCreate> for TeamMemberCreateDBRequest {
    type Error = Error;

    fn try_from(request: TeamMemberCreate) -> Result<Self> {
        let mut fields = Vec::new();
        let image = media_for_create(MediaField::Image, request.image_url, request.image_key, &mut fields);
        ensure_valid(fields)?;

        Ok(Self {
            name: request.name,
            position: request.position,
            bio: request.bio,
            sort_order: request.sort_order,
            is_active: request.is_active,
            image,
        })
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub position: Option<String>,
    pub bio: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub sort_order: Option<i32>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub is_active: Option<bool>,
    /// `null` removes the photo
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    pub image_key: Option<String>,
}

impl MediaForm for TeamMemberUpdate {
    const UPLOADS: &'static [(MediaField, UploadFolder)] = TeamMemberCreate::UPLOADS;
}

impl TryFrom<TeamMemberUpdate> for TeamMemberUpdateDBRequest {
    type Error = Error;

    fn try_from(request: TeamMemberUpdate) -> Result<Self> {
        let mut fields = Vec::new();
        let image = media_for_update(MediaField::Image, request.image_url, request.image_key, &mut fields);
        ensure_valid(fields)?;

        Ok(Self {
            name: request.name,
            position: request.position,
            bio: request.bio,
            sort_order: request.sort_order,
            is_active: request.is_active,
            image,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberResponse {
    #[schema(value_type = String, format = "uuid")]
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

impl From<TeamMemberDBResponse> for TeamMemberResponse {
    fn from(db: TeamMemberDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            position: db.position,
            bio: db.bio,
            sort_order: db.sort_order,
            is_active: db.is_active,
            image_url: db.image_url,
            image_key: db.image_key,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl Signable for TeamMemberResponse {
    fn media_slots(&mut self) -> Vec<MediaSlot<'_>> {
        vec![MediaSlot::new(MediaField::Image, &mut self.image_url, &self.image_key)]
    }
}
