//! API request/response models for contact form submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::pagination::Pagination;
use crate::db::models::contacts::{ContactCreateDBRequest, ContactDBResponse, ContactStatus, ContactUpdateDBRequest};
use crate::types::ContactSubmissionId;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactCreate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "name is required (at most 200 characters)"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub company: Option<String>,
    /// The service the enquiry is about (editing, color grading, motion graphics, ...)
    #[validate(length(max = 100))]
    pub service: Option<String>,
    #[validate(length(max = 100))]
    pub budget: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 10000, message = "message is required (at most 10000 characters)"))]
    pub message: String,
}

impl From<ContactCreate> for ContactCreateDBRequest {
    fn from(request: ContactCreate) -> Self {
        Self {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone,
            company: request.company,
            service: request.service,
            budget: request.budget,
            message: request.message,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ContactUpdate {
    pub status: Option<ContactStatus>,
}

impl From<ContactUpdate> for ContactUpdateDBRequest {
    fn from(request: ContactUpdate) -> Self {
        Self { status: request.status }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListContactsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only submissions in this status
    pub status: Option<ContactStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    #[schema(value_type = String, format = "uuid")]
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

impl From<ContactDBResponse> for ContactResponse {
    fn from(db: ContactDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            phone: db.phone,
            company: db.company,
            service: db.service,
            budget: db.budget,
            message: db.message,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
