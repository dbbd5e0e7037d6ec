use axum::{extract::State, http::StatusCode};
use tracing::{info, instrument};

use super::{db_error, not_found};
use crate::{
    AppState,
    api::{
        extract::{ApiPath, ApiQuery, MediaPayload},
        models::{
            ApiResponse, Deleted, created,
            pagination::Pagination,
            reels::{ReelCreate, ReelResponse, ReelUpdate},
        },
    },
    db::{
        handlers::{Repository, Reels, reels::ReelFilter},
        models::reels::{ReelCreateDBRequest, ReelDBResponse, ReelUpdateDBRequest},
    },
    errors::Result,
    storage::cleanup::{owned_keys, replaced_keys},
    types::ReelId,
};

const RESOURCE: &str = "Reel";

async fn respond(state: &AppState, reel: ReelDBResponse) -> ReelResponse {
    state.signer.sign_document(ReelResponse::from(reel)).await
}

/// List active reels
#[utoipa::path(
    get,
    path = "/reels",
    tag = "public",
    params(Pagination),
    responses(
        (status = 200, description = "Active reels in display order", body = ApiResponse<Vec<ReelResponse>>),
    )
)]
#[instrument(skip_all)]
pub async fn list_public_reels(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<ApiResponse<Vec<ReelResponse>>> {
    let (skip, limit) = pagination.params();
    let filter = ReelFilter {
        active_only: true,
        ..ReelFilter::new(skip, limit)
    };
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let reels = Reels::new(&mut conn).list(&filter).await?;

    let reels = state.signer.sign_all(reels.into_iter().map(Into::into).collect()).await;
    Ok(ApiResponse::new(reels))
}

/// List reels
#[utoipa::path(
    get,
    path = "/reels",
    tag = "reels",
    params(Pagination),
    responses(
        (status = 200, description = "All reels in display order", body = ApiResponse<Vec<ReelResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_reels(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<ApiResponse<Vec<ReelResponse>>> {
    let (skip, limit) = pagination.params();
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let reels = Reels::new(&mut conn).list(&ReelFilter::new(skip, limit)).await?;

    let reels = state.signer.sign_all(reels.into_iter().map(Into::into).collect()).await;
    Ok(ApiResponse::new(reels))
}

/// Get a reel
#[utoipa::path(
    get,
    path = "/reels/{id}",
    tag = "reels",
    params(("id" = uuid::Uuid, Path, description = "Reel id")),
    responses(
        (status = 200, description = "Reel", body = ApiResponse<ReelResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_reel(State(state): State<AppState>, ApiPath(id): ApiPath<ReelId>) -> Result<ApiResponse<ReelResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let reel = Reels::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(RESOURCE, id))?;

    Ok(ApiResponse::new(respond(&state, reel).await))
}

/// Create a reel
///
/// Accepts JSON with presigned upload results, or `multipart/form-data` with `video` and
/// `thumbnail` file parts.
#[utoipa::path(
    post,
    path = "/reels",
    tag = "reels",
    request_body = ReelCreate,
    responses(
        (status = 201, description = "Created", body = ApiResponse<ReelResponse>),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "Upload too large"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_reel(
    State(state): State<AppState>,
    payload: MediaPayload<ReelCreate>,
) -> Result<(StatusCode, ApiResponse<ReelResponse>)> {
    let MediaPayload { data, uploads } = payload;

    let result: Result<_> = async {
        let request = ReelCreateDBRequest::try_from(data)?;
        let mut conn = state.db.acquire().await.map_err(db_error)?;
        Ok(Reels::new(&mut conn).create(&request).await?)
    }
    .await;
    let reel = uploads.release_on_error(&state.cleanup, result)?;

    info!(reel_id = %reel.id, "Created reel");
    Ok(created(respond(&state, reel).await))
}

/// Update a reel
#[utoipa::path(
    patch,
    path = "/reels/{id}",
    tag = "reels",
    request_body = ReelUpdate,
    params(("id" = uuid::Uuid, Path, description = "Reel id")),
    responses(
        (status = 200, description = "Updated", body = ApiResponse<ReelResponse>),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_reel(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ReelId>,
    payload: MediaPayload<ReelUpdate>,
) -> Result<ApiResponse<ReelResponse>> {
    let MediaPayload { data, uploads } = payload;

    let result: Result<_> = async {
        let request = ReelUpdateDBRequest::try_from(data)?;
        let mut tx = state.db.begin().await.map_err(db_error)?;
        let mut repo = Reels::new(&mut tx);

        let before = repo.get_for_update(id).await?.ok_or_else(|| not_found(RESOURCE, id))?;
        let after = repo.update(id, &request).await?;
        tx.commit().await.map_err(db_error)?;
        Ok((before, after))
    }
    .await;
    let (before, after) = uploads.release_on_error(&state.cleanup, result)?;

    state.cleanup.enqueue_all(replaced_keys(&state.urls, &before, &after));
    Ok(ApiResponse::new(respond(&state, after).await))
}

/// Delete a reel and its media
#[utoipa::path(
    delete,
    path = "/reels/{id}",
    tag = "reels",
    params(("id" = uuid::Uuid, Path, description = "Reel id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_reel(State(state): State<AppState>, ApiPath(id): ApiPath<ReelId>) -> Result<ApiResponse<Deleted>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let reel = Reels::new(&mut conn)
        .remove(id)
        .await?
        .ok_or_else(|| not_found(RESOURCE, id))?;

    state.cleanup.enqueue_all(owned_keys(&state.urls, &reel));
    info!(reel_id = %id, "Deleted reel");
    Ok(ApiResponse::new(Deleted { deleted: true }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{Value, json};
    use sqlx::PgPool;

    use crate::test_utils::{admin_cookie, create_test_server, create_test_state};

    #[sqlx::test]
    #[test_log::test]
    async fn test_public_reels_sorted_and_active_only(pool: PgPool) {
        let ctx = create_test_state(pool);
        let server = create_test_server(&ctx.state);
        let cookie = admin_cookie(&ctx.state.config);

        for (title, sort_order, active) in [("Third", 3, true), ("First", 1, true), ("Hidden", 0, false)] {
            server
                .post("/admin/api/v1/reels")
                .add_header("cookie", cookie.clone())
                .json(&json!({ "title": title, "sortOrder": sort_order, "isActive": active }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let body: Value = server.get("/api/reels").await.json();
        let titles: Vec<&str> = body["data"].as_array().unwrap().iter().map(|r| r["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["First", "Third"]);

        let body: Value = server.get("/api/reels?limit=1").await.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let response = server.get("/api/reels?limit=lots").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], false);

        let all: Value = server.get("/admin/api/v1/reels").add_header("cookie", cookie).await.json();
        assert_eq!(all["data"].as_array().unwrap().len(), 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_multipart_update_replaces_video(pool: PgPool) {
        let ctx = create_test_state(pool);
        let server = create_test_server(&ctx.state);
        let cookie = admin_cookie(&ctx.state.config);

        let created: Value = server
            .post("/admin/api/v1/reels")
            .add_header("cookie", cookie.clone())
            .json(&json!({
                "title": "Reel",
                "videoUrl": "https://media.example.com/reels/1-a.mp4",
                "videoKey": "reels/1-a.mp4"
            }))
            .await
            .json();
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let response = server
            .patch(&format!("/admin/api/v1/reels/{id}"))
            .add_header("cookie", cookie.clone())
            .multipart(
                MultipartForm::new()
                    .add_text("sortOrder", "4")
                    .add_part("video", Part::bytes(b"webm".as_slice()).file_name("b.webm").mime_type("video/webm")),
            )
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        let new_key = body["data"]["videoKey"].as_str().unwrap().to_string();
        assert!(new_key.starts_with("reels/") && new_key.ends_with("-b.webm"));
        assert_eq!(body["data"]["title"], "Reel");
        assert_eq!(body["data"]["sortOrder"], 4);

        server
            .delete(&format!("/admin/api/v1/reels/{id}"))
            .add_header("cookie", cookie.clone())
            .await
            .assert_status_ok();
        server
            .get(&format!("/admin/api/v1/reels/{id}"))
            .add_header("cookie", cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        assert_eq!(ctx.drain_cleanup().await, vec!["reels/1-a.mp4".to_string(), new_key]);
    }
}
