//! API request and response data models.
//!
//! These types define the public JSON contract and are kept separate from the database records
//! in [`crate::db::models`]. Request types are camelCase on the wire, validated with
//! `validator` and converted into repository requests with `TryFrom`. Response types carry
//! media URLs and implement [`Signable`](crate::storage::Signable) so handlers can pass them
//! through the URL signer before serializing.
//!
//! Every successful response is wrapped in [`ApiResponse`]; failures are rendered by
//! [`Error`](crate::errors::Error) in the matching `{ success: false, error }` shape.

pub mod about_video;
pub mod applications;
pub mod contacts;
pub mod jobs;
pub mod media;
pub mod pagination;
pub mod portfolio;
pub mod reels;
pub mod showreels;
pub mod team;
pub mod uploads;
pub mod users;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

/// Success envelope: `{ "success": true, "data": ... }`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `201 Created` with the envelope.
pub fn created<T: Serialize>(data: T) -> (StatusCode, ApiResponse<T>) {
    (StatusCode::CREATED, ApiResponse::new(data))
}

/// Body of a successful delete.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Deleted {
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_success_envelope() {
        let response = ApiResponse::new(vec!["a", "b"]).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true, "data": ["a", "b"] }));
    }

    #[test]
    fn test_created_status() {
        let (status, body) = created(Deleted { deleted: false });
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.success);
    }
}
