//! Database models for job applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::storage::MediaField;
use crate::storage::cleanup::{StoredMedia, StoredRef};
use crate::types::{ApplicationId, JobId};

/// Where an application is in the hiring pipeline. Stored as TEXT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    New,
    Reviewed,
    Shortlisted,
    Rejected,
    Hired,
}

#[derive(Debug, Clone)]
pub struct ApplicationCreateDBRequest {
    pub job_id: JobId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub portfolio_url: Option<String>,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub resume_key: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationUpdateDBRequest {
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ApplicationDBResponse {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub portfolio_url: Option<String>,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub resume_key: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredMedia for ApplicationDBResponse {
    fn stored_media(&self) -> Vec<StoredRef<'_>> {
        vec![StoredRef::new(MediaField::Resume, &self.resume_url, &self.resume_key)]
    }
}
