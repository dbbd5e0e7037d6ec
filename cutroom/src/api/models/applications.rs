//! API request/response models for job applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::media::{ensure_valid, media_for_create};
use super::pagination::Pagination;
use crate::api::extract::MediaForm;
use crate::db::models::applications::{
    ApplicationCreateDBRequest, ApplicationDBResponse, ApplicationStatus, ApplicationUpdateDBRequest,
};
use crate::errors::Result;
use crate::storage::signing::MediaSlot;
use crate::storage::{MediaField, Signable, UploadFolder};
use crate::types::{ApplicationId, JobId};

/// A candidate applying to a job. The resume can only arrive as an uploaded file part; the
/// `resumeUrl`/`resumeKey` pair is filled in by the server.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCreate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "name is required (at most 200 characters)"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(url(message = "portfolioUrl must be a valid URL"))]
    pub portfolio_url: Option<String>,
    #[validate(length(max = 10000))]
    pub cover_letter: Option<String>,
    #[schema(read_only)]
    pub resume_url: Option<String>,
    #[schema(read_only)]
    pub resume_key: Option<String>,
}

impl MediaForm for ApplicationCreate {
    const UPLOADS: &'static [(MediaField, UploadFolder)] = &[(MediaField::Resume, UploadFolder::Resumes)];
    const CLIENT_MEDIA_REFS: bool = false;
}

impl ApplicationCreate {
    pub fn into_db_request(self, job_id: JobId) -> Result<ApplicationCreateDBRequest> {
        let mut fields = Vec::new();
        let resume = media_for_create(MediaField::Resume, self.resume_url, self.resume_key, &mut fields);
        ensure_valid(fields)?;

        Ok(ApplicationCreateDBRequest {
            job_id,
            name: self.name.trim().to_string(),
            // One application per job and address, regardless of case
            email: self.email.trim().to_lowercase(),
            phone: self.phone,
            portfolio_url: self.portfolio_url,
            cover_letter: self.cover_letter,
            resume_url: resume.url,
            resume_key: resume.key,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ApplicationUpdate {
    pub status: Option<ApplicationStatus>,
}

impl From<ApplicationUpdate> for ApplicationUpdateDBRequest {
    fn from(request: ApplicationUpdate) -> Self {
        Self { status: request.status }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListApplicationsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only applications for this job
    #[param(value_type = Option<String>, format = Uuid)]
    pub job_id: Option<JobId>,

    /// Only applications in this status
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ApplicationId,
    #[schema(value_type = String, format = "uuid")]
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

impl From<ApplicationDBResponse> for ApplicationResponse {
    fn from(db: ApplicationDBResponse) -> Self {
        Self {
            id: db.id,
            job_id: db.job_id,
            name: db.name,
            email: db.email,
            phone: db.phone,
            portfolio_url: db.portfolio_url,
            cover_letter: db.cover_letter,
            resume_url: db.resume_url,
            resume_key: db.resume_key,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl Signable for ApplicationResponse {
    fn media_slots(&mut self) -> Vec<MediaSlot<'_>> {
        vec![MediaSlot::new(MediaField::Resume, &mut self.resume_url, &self.resume_key)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_email_is_normalized() {
        let request: ApplicationCreate = serde_json::from_value(json!({
            "name": " Alex ",
            "email": " Alex@Example.COM "
        }))
        .unwrap();

        let db = request.into_db_request(Uuid::new_v4()).unwrap();
        assert_eq!(db.email, "alex@example.com");
        assert_eq!(db.name, "Alex");
        assert_eq!(db.resume_url, None);
    }

    #[test]
    fn test_invalid_fields_reported() {
        let request: ApplicationCreate = serde_json::from_value(json!({
            "email": "nope",
            "portfolioUrl": "not a url"
        }))
        .unwrap();

        let crate::errors::Error::Validation { fields } = crate::errors::Error::from(request.validate().unwrap_err()) else {
            panic!("expected validation error");
        };
        let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["email", "name", "portfolioUrl"]);
    }

    #[test]
    fn test_status_wire_format() {
        let update: ApplicationUpdate = serde_json::from_value(json!({ "status": "shortlisted" })).unwrap();
        assert_eq!(update.status, Some(ApplicationStatus::Shortlisted));
        assert!(serde_json::from_value::<ApplicationUpdate>(json!({ "status": "maybe" })).is_err());
    }
}
