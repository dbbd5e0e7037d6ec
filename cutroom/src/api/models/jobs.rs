//! API request/response models for job postings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, OneOrMany, PickFirst, formats::PreferMany, serde_as};
use utoipa::ToSchema;
use validator::Validate;

use super::media::{ensure_valid, slugify, validate_slug};
use crate::db::models::jobs::{JobCreateDBRequest, JobDBResponse, JobUpdateDBRequest};
use crate::errors::{Error, FieldError, Result};
use crate::types::JobId;

fn default_true() -> bool {
    true
}

/// Drop blank lines an admin left in the requirements list.
fn clean_requirements(requirements: Vec<String>) -> Vec<String> {
    requirements
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title is required (at most 200 characters)"))]
    pub title: String,
    /// Derived from the title when omitted
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    /// A single string is accepted as a one-item list
    #[serde_as(as = "OneOrMany<_, PreferMany>")]
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl TryFrom<JobCreate> for JobCreateDBRequest {
    type Error = Error;

    fn try_from(request: JobCreate) -> Result<Self> {
        let slug = request.slug.unwrap_or_else(|| slugify(&request.title));
        if validate_slug(&slug).is_err() {
            ensure_valid(vec![FieldError::new("slug", "slug could not be derived from the title")])?;
        }

        Ok(Self {
            title: request.title,
            slug,
            department: request.department,
            location: request.location,
            employment_type: request.employment_type,
            description: request.description,
            requirements: clean_requirements(request.requirements),
            is_active: request.is_active,
        })
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[serde_as(as = "Option<OneOrMany<_, PreferMany>>")]
    pub requirements: Option<Vec<String>>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub is_active: Option<bool>,
}

impl From<JobUpdate> for JobUpdateDBRequest {
    fn from(request: JobUpdate) -> Self {
        Self {
            title: request.title,
            slug: request.slug,
            department: request.department,
            location: request.location,
            employment_type: request.employment_type,
            description: request.description,
            requirements: request.requirements.map(clean_requirements),
            is_active: request.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: JobId,
    pub title: String,
    pub slug: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub description: String,
    pub requirements: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JobDBResponse> for JobResponse {
    fn from(db: JobDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            slug: db.slug,
            department: db.department,
            location: db.location,
            employment_type: db.employment_type,
            description: db.description,
            requirements: db.requirements,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
