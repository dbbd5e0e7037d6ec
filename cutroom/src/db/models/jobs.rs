//! Database models for job postings.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::JobId;

#[derive(Debug, Clone)]
pub struct JobCreateDBRequest {
    pub title: String,
    pub slug: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub description: String,
    pub requirements: Vec<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct JobUpdateDBRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow)]
pub struct JobDBResponse {
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
