//! The about-page video. There is at most one, so the routes carry no id.

use axum::extract::State;
use tracing::{info, instrument};

use super::{db_error, not_found};
use crate::{
    AppState,
    api::{
        extract::MediaPayload,
        models::{
            ApiResponse, Deleted,
            about_video::{AboutVideoResponse, AboutVideoUpsert},
        },
    },
    db::{handlers::AboutVideos, models::about_video::AboutVideoUpsertDBRequest},
    errors::Result,
    storage::cleanup::{owned_keys, replaced_keys},
};

async fn current(state: &AppState) -> Result<Option<AboutVideoResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    Ok(match AboutVideos::new(&mut conn).get().await? {
        Some(video) => Some(state.signer.sign_document(AboutVideoResponse::from(video)).await),
        None => None,
    })
}

/// The about video
#[utoipa::path(
    get,
    path = "/about-video",
    tag = "public",
    responses(
        (status = 200, description = "The about video, or `null` when none is set", body = ApiResponse<Option<AboutVideoResponse>>),
    )
)]
#[instrument(skip_all)]
pub async fn get_public_about_video(State(state): State<AppState>) -> Result<ApiResponse<Option<AboutVideoResponse>>> {
    Ok(ApiResponse::new(current(&state).await?))
}

/// Get the about video
#[utoipa::path(
    get,
    path = "/about-video",
    tag = "about-video",
    responses(
        (status = 200, description = "The about video, or `null` when none is set", body = ApiResponse<Option<AboutVideoResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_about_video(State(state): State<AppState>) -> Result<ApiResponse<Option<AboutVideoResponse>>> {
    Ok(ApiResponse::new(current(&state).await?))
}

/// Set the about video
///
/// Creates it on first use. Title and description are replaced; media not sent is kept, and
/// media that is replaced or cleared is deleted from storage.
#[utoipa::path(
    put,
    path = "/about-video",
    tag = "about-video",
    request_body = AboutVideoUpsert,
    responses(
        (status = 200, description = "Saved", body = ApiResponse<AboutVideoResponse>),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "Upload too large"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn put_about_video(
    State(state): State<AppState>,
    payload: MediaPayload<AboutVideoUpsert>,
) -> Result<ApiResponse<AboutVideoResponse>> {
    let MediaPayload { data, uploads } = payload;

    let result: Result<_> = async {
        let request = AboutVideoUpsertDBRequest::try_from(data)?;
        let mut tx = state.db.begin().await.map_err(db_error)?;
        let mut repo = AboutVideos::new(&mut tx);

        let before = repo.get_for_update().await?;
        let after = repo.upsert(&request).await?;
        tx.commit().await.map_err(db_error)?;
        Ok((before, after))
    }
    .await;
    let (before, after) = uploads.release_on_error(&state.cleanup, result)?;

    if let Some(before) = &before {
        state.cleanup.enqueue_all(replaced_keys(&state.urls, before, &after));
    } else {
        info!("Created about video");
    }
    Ok(ApiResponse::new(state.signer.sign_document(AboutVideoResponse::from(after)).await))
}

/// Remove the about video and its media
#[utoipa::path(
    delete,
    path = "/about-video",
    tag = "about-video",
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No about video is set"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_about_video(State(state): State<AppState>) -> Result<ApiResponse<Deleted>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let video = AboutVideos::new(&mut conn)
        .remove()
        .await?
        .ok_or_else(|| not_found("About video", "current"))?;

    state.cleanup.enqueue_all(owned_keys(&state.urls, &video));
    Ok(ApiResponse::new(Deleted { deleted: true }))
}
