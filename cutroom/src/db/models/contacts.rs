//! Database models for contact form submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::ContactSubmissionId;

/// Triage state of a contact submission. Stored as TEXT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    New,
    Read,
    Replied,
    Archived,
}

#[derive(Debug, Clone)]
pub struct ContactCreateDBRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub service: Option<String>,
    pub budget: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ContactUpdateDBRequest {
    pub status: Option<ContactStatus>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ContactDBResponse {
    pub id: ContactSubmissionId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub service: Option<String>,
    pub budget: Option<String>,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
