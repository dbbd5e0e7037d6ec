//! Upload endpoints.
//!
//! Large media goes browser -> bucket through [`presign`]. [`upload_thumbnail`] is the small
//! server-side path used for posters captured in the admin UI.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::{
        extract::ValidJson,
        models::{ApiResponse, created, uploads::PresignRequest},
    },
    errors::{Error, Result},
    storage::{StorageObjectReference, UploadFolder, presign::PresignedUpload},
};

/// Presign a direct upload
#[utoipa::path(
    post,
    path = "/uploads/presign",
    tag = "uploads",
    request_body = PresignRequest,
    responses(
        (status = 200, description = "Upload target; PUT the file to `uploadUrl` with `headers`", body = ApiResponse<PresignedUpload>),
        (status = 400, description = "Missing field, unknown folder or content type not allowed in the folder"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Object store could not sign the request"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all, fields(folder = %request.folder))]
pub async fn presign(State(state): State<AppState>, ValidJson(request): ValidJson<PresignRequest>) -> Result<ApiResponse<PresignedUpload>> {
    let upload = state.issuer.issue(&request.file_name, &request.content_type, &request.folder).await?;
    Ok(ApiResponse::new(upload))
}

/// Upload a thumbnail through the server
#[utoipa::path(
    post,
    path = "/thumbnails",
    tag = "uploads",
    request_body(content_type = "multipart/form-data", description = "Image in the `file` field"),
    responses(
        (status = 201, description = "Stored thumbnail", body = ApiResponse<StorageObjectReference>),
        (status = 400, description = "Missing file or not an image"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "File too large"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, ApiResponse<StorageObjectReference>)> {
    let max_size = state.config.uploads.max_body_size;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("thumbnail").to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| mime_guess::from_path(&file_name).first_or_octet_stream().essence_str().to_string());

        let mut body = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| Error::BadRequest {
            message: format!("Failed to read file chunk: {e}"),
        })? {
            if body.len() + chunk.len() > max_size {
                return Err(Error::PayloadTooLarge {
                    message: format!("File size exceeds maximum allowed size of {max_size} bytes"),
                });
            }
            body.extend_from_slice(&chunk);
        }
        if body.is_empty() {
            return Err(Error::invalid_field("file", "file is empty"));
        }

        debug!(file_name = %file_name, size = body.len(), "Received thumbnail");
        let reference = state
            .issuer
            .upload(UploadFolder::Thumbnails, &file_name, &content_type, body.into())
            .await?;
        return Ok(created(reference));
    }

    Err(Error::invalid_field("file", "file is required"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::json;

    use crate::storage::keys::VIDEO_CACHE_CONTROL;
    use crate::test_utils::{RecordingStore, StoreCall, admin_cookie, create_test_server, create_test_state, lazy_pool};

    #[tokio::test]
    async fn test_presign_returns_upload_target() {
        let ctx = create_test_state(lazy_pool());
        let server = create_test_server(&ctx.state);

        let response = server
            .post("/admin/api/v1/uploads/presign")
            .add_header("cookie", admin_cookie(&ctx.state.config))
            .json(&json!({ "fileName": "Final Cut.mp4", "contentType": "video/mp4", "folder": "portfolio" }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], true);
        let key = body["data"]["key"].as_str().unwrap().to_string();
        assert!(key.starts_with("portfolio/") && key.ends_with("-Final_Cut.mp4"), "{key}");
        assert_eq!(body["data"]["publicUrl"], format!("https://media.example.com/{key}"));
        assert_eq!(body["data"]["uploadUrl"], RecordingStore::signed_put_url(&key));
        assert_eq!(body["data"]["headers"]["Cache-Control"], VIDEO_CACHE_CONTROL);
        assert_eq!(body["data"]["headers"]["Content-Type"], "video/mp4");

        assert_eq!(
            ctx.store.calls(),
            vec![StoreCall::PresignPut {
                key,
                content_type: "video/mp4".to_string(),
                cache_control: VIDEO_CACHE_CONTROL.to_string(),
                expires_in: Duration::from_secs(3600),
            }]
        );
    }

    #[tokio::test]
    async fn test_presign_rejects_unknown_folder() {
        let ctx = create_test_state(lazy_pool());
        let server = create_test_server(&ctx.state);

        let response = server
            .post("/admin/api/v1/uploads/presign")
            .add_header("cookie", admin_cookie(&ctx.state.config))
            .json(&json!({ "fileName": "a.mp4", "contentType": "video/mp4", "folder": "../secrets" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["fields"][0]["field"], "folder");
        assert!(ctx.store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_presign_requires_session() {
        let ctx = create_test_state(lazy_pool());
        let server = create_test_server(&ctx.state);

        let response = server
            .post("/admin/api/v1/uploads/presign")
            .json(&json!({ "fileName": "a.mp4", "contentType": "video/mp4", "folder": "portfolio" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert!(ctx.store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_presign_store_failure_is_internal() {
        let ctx = create_test_state(lazy_pool());
        ctx.store.fail_presign(true);
        let server = create_test_server(&ctx.state);

        let response = server
            .post("/admin/api/v1/uploads/presign")
            .add_header("cookie", admin_cookie(&ctx.state.config))
            .json(&json!({ "fileName": "a.mp4", "contentType": "video/mp4", "folder": "reels" }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<serde_json::Value>()["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_thumbnail_upload() {
        let ctx = create_test_state(lazy_pool());
        let server = create_test_server(&ctx.state);

        let response = server
            .post("/admin/api/v1/thumbnails")
            .add_header("cookie", admin_cookie(&ctx.state.config))
            .multipart(
                MultipartForm::new().add_part("file", Part::bytes(b"\x89PNG".as_slice()).file_name("poster frame.png").mime_type("image/png")),
            )
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: serde_json::Value = response.json();
        let key = body["data"]["key"].as_str().unwrap().to_string();
        assert!(key.starts_with("thumbnails/") && key.ends_with("-poster_frame.png"), "{key}");
        assert_eq!(ctx.store.put_keys(), vec![key]);
    }

    #[tokio::test]
    async fn test_thumbnail_must_be_an_image() {
        let ctx = create_test_state(lazy_pool());
        let server = create_test_server(&ctx.state);

        let response = server
            .post("/admin/api/v1/thumbnails")
            .add_header("cookie", admin_cookie(&ctx.state.config))
            .multipart(MultipartForm::new().add_part("file", Part::bytes(b"%PDF".as_slice()).file_name("cv.pdf").mime_type("application/pdf")))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(ctx.store.put_keys().is_empty());

        let response = server
            .post("/admin/api/v1/thumbnails")
            .add_header("cookie", admin_cookie(&ctx.state.config))
            .multipart(MultipartForm::new().add_text("title", "no file"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<serde_json::Value>()["fields"][0]["field"], "file");
    }
}
