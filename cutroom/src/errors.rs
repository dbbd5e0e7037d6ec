use crate::db::errors::DbError;
use crate::storage::StorageError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Malformed request
    #[error("{message}")]
    BadRequest { message: String },

    /// Request body parsed but failed field validation
    #[error("Validation failed: {}", summarize(.fields))]
    Validation { fields: Vec<FieldError> },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Conflict error, e.g., for unique constraint violations
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Upload exceeded the configured body limit
    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Object store operation error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields.iter().map(|f| format!("{}: {}", f.field, f.message)).collect::<Vec<_>>().join(", ")
}

impl Error {
    /// Shorthand for a validation error on a single field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            fields: vec![FieldError::new(field, message)],
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::BadRequest { .. } | Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Internal { .. } | Error::Storage(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::BadRequest { message } => message.clone(),
            Error::Validation { .. } => "Validation failed".to_string(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Conflict { message } => message.clone(),
            Error::PayloadTooLarge { message } => message.clone(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(c)) if c.contains("email") => "An account with this email address already exists".to_string(),
                    (Some("jobs"), Some(c)) if c.contains("slug") => "A job posting with this slug already exists".to_string(),
                    (Some("portfolio_items"), Some(c)) if c.contains("slug") => {
                        "A portfolio item with this slug already exists".to_string()
                    }
                    (Some("applications"), Some(c)) if c.contains("email") => {
                        "An application for this position has already been submitted with this email address".to_string()
                    }
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Internal server error".to_string(),
            },
            Error::Internal { .. } | Error::Storage(_) | Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Storage(_) | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) | Error::Conflict { .. } => {
                tracing::warn!("Conflict or constraint error: {}", self);
            }
            Error::Unauthenticated { .. } => {
                tracing::info!("Authentication error: {}", self);
            }
            Error::BadRequest { .. } | Error::Validation { .. } | Error::NotFound { .. } | Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = match &self {
            Error::Validation { fields } => json!({
                "success": false,
                "error": self.user_message(),
                "fields": fields,
            }),
            _ => json!({
                "success": false,
                "error": self.user_message(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid ({})", e.code));
                    FieldError::new(camel_case(&field), message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        Error::Validation { fields }
    }
}

/// Request bodies are camelCase on the wire; report fields the way clients sent them.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use validator::Validate;

    async fn body_json(error: Error) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_uses_failure_envelope() {
        let (status, body) = body_json(Error::NotFound {
            resource: "Portfolio item".to_string(),
            id: "abc".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Portfolio item with ID abc not found");
        assert!(body.get("fields").is_none());
    }

    #[tokio::test]
    async fn test_internal_errors_hide_detail() {
        let (status, body) = body_json(Error::Internal {
            operation: "connect to s3 at 10.0.0.4 with key AKIA...".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");

        let (status, body) = body_json(Error::Storage(StorageError::Request {
            operation: "delete object".to_string(),
            message: "connection reset".to_string(),
        }))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let (status, body) = body_json(Error::Validation {
            fields: vec![
                FieldError::new("folder", "Unknown upload folder"),
                FieldError::new("fileName", "fileName is required"),
            ],
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["fields"][0]["field"], "folder");
        assert_eq!(body["fields"][1]["message"], "fileName is required");
    }

    #[tokio::test]
    async fn test_unique_violation_is_conflict() {
        let error = Error::Database(DbError::UniqueViolation {
            constraint: Some("jobs_slug_key".to_string()),
            table: Some("jobs".to_string()),
            message: "duplicate key".to_string(),
        });
        let (status, body) = body_json(error).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "A job posting with this slug already exists");
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "title is required"))]
        title: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_from_validation_errors_is_sorted_and_messaged() {
        let sample = Sample {
            title: String::new(),
            email: "not-an-email".to_string(),
        };
        let Error::Validation { fields } = Error::from(sample.validate().unwrap_err()) else {
            panic!("expected validation error");
        };

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "email");
        assert_eq!(fields[0].message, "email is invalid (email)");
        assert_eq!(fields[1], FieldError::new("title", "title is required"));
    }

    #[test]
    fn test_camel_case_field_names() {
        assert_eq!(camel_case("file_name"), "fileName");
        assert_eq!(camel_case("video_url"), "videoUrl");
        assert_eq!(camel_case("title"), "title");
    }
}
