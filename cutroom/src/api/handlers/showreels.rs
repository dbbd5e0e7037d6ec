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
            showreels::{ShowreelCreate, ShowreelResponse, ShowreelUpdate},
        },
    },
    db::{
        handlers::{Repository, Showreels, showreels::ShowreelFilter},
        models::showreels::{ShowreelCreateDBRequest, ShowreelDBResponse, ShowreelUpdateDBRequest},
    },
    errors::Result,
    storage::cleanup::{owned_keys, replaced_keys},
    types::ShowreelId,
};

const RESOURCE: &str = "Showreel";

async fn respond(state: &AppState, showreel: ShowreelDBResponse) -> ShowreelResponse {
    state.signer.sign_document(ShowreelResponse::from(showreel)).await
}

/// The current showreel
///
/// The most recently created active showreel, or `null` when there is none.
#[utoipa::path(
    get,
    path = "/showreel",
    tag = "public",
    responses(
        (status = 200, description = "Current showreel", body = ApiResponse<Option<ShowreelResponse>>),
    )
)]
#[instrument(skip_all)]
pub async fn get_public_showreel(State(state): State<AppState>) -> Result<ApiResponse<Option<ShowreelResponse>>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let showreel = match Showreels::new(&mut conn).latest_active().await? {
        Some(showreel) => Some(respond(&state, showreel).await),
        None => None,
    };

    Ok(ApiResponse::new(showreel))
}

/// List showreels
#[utoipa::path(
    get,
    path = "/showreels",
    tag = "showreels",
    params(Pagination),
    responses(
        (status = 200, description = "All showreels, newest first", body = ApiResponse<Vec<ShowreelResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_showreels(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<ApiResponse<Vec<ShowreelResponse>>> {
    let (skip, limit) = pagination.params();
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let showreels = Showreels::new(&mut conn).list(&ShowreelFilter::new(skip, limit)).await?;

    let showreels = state.signer.sign_all(showreels.into_iter().map(Into::into).collect()).await;
    Ok(ApiResponse::new(showreels))
}

/// Get a showreel
#[utoipa::path(
    get,
    path = "/showreels/{id}",
    tag = "showreels",
    params(("id" = uuid::Uuid, Path, description = "Showreel id")),
    responses(
        (status = 200, description = "Showreel", body = ApiResponse<ShowreelResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_showreel(State(state): State<AppState>, ApiPath(id): ApiPath<ShowreelId>) -> Result<ApiResponse<ShowreelResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let showreel = Showreels::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(RESOURCE, id))?;

    Ok(ApiResponse::new(respond(&state, showreel).await))
}

/// Create a showreel
///
/// Accepts JSON with presigned upload results, or `multipart/form-data` with `video` and
/// `thumbnail` file parts.
#[utoipa::path(
    post,
    path = "/showreels",
    tag = "showreels",
    request_body = ShowreelCreate,
    responses(
        (status = 201, description = "Created", body = ApiResponse<ShowreelResponse>),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "Upload too large"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_showreel(
    State(state): State<AppState>,
    payload: MediaPayload<ShowreelCreate>,
) -> Result<(StatusCode, ApiResponse<ShowreelResponse>)> {
    let MediaPayload { data, uploads } = payload;

    let result: Result<_> = async {
        let request = ShowreelCreateDBRequest::try_from(data)?;
        let mut conn = state.db.acquire().await.map_err(db_error)?;
        Ok(Showreels::new(&mut conn).create(&request).await?)
    }
    .await;
    let showreel = uploads.release_on_error(&state.cleanup, result)?;

    info!(showreel_id = %showreel.id, "Created showreel");
    Ok(created(respond(&state, showreel).await))
}

/// Update a showreel
#[utoipa::path(
    patch,
    path = "/showreels/{id}",
    tag = "showreels",
    request_body = ShowreelUpdate,
    params(("id" = uuid::Uuid, Path, description = "Showreel id")),
    responses(
        (status = 200, description = "Updated", body = ApiResponse<ShowreelResponse>),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_showreel(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ShowreelId>,
    payload: MediaPayload<ShowreelUpdate>,
) -> Result<ApiResponse<ShowreelResponse>> {
    let MediaPayload { data, uploads } = payload;

    let result: Result<_> = async {
        let request = ShowreelUpdateDBRequest::try_from(data)?;
        let mut tx = state.db.begin().await.map_err(db_error)?;
        let mut repo = Showreels::new(&mut tx);

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

/// Delete a showreel and its media
#[utoipa::path(
    delete,
    path = "/showreels/{id}",
    tag = "showreels",
    params(("id" = uuid::Uuid, Path, description = "Showreel id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_showreel(State(state): State<AppState>, ApiPath(id): ApiPath<ShowreelId>) -> Result<ApiResponse<Deleted>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let showreel = Showreels::new(&mut conn)
        .remove(id)
        .await?
        .ok_or_else(|| not_found(RESOURCE, id))?;

    state.cleanup.enqueue_all(owned_keys(&state.urls, &showreel));
    info!(showreel_id = %id, "Deleted showreel");
    Ok(ApiResponse::new(Deleted { deleted: true }))
}
