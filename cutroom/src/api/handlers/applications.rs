use axum::{extract::State, http::StatusCode};
use tracing::{info, instrument};

use super::{
    db_error,
    jobs::{find_job, shown},
    not_found,
};
use crate::{
    AppState,
    api::{
        extract::{ApiPath, ApiQuery, MediaPayload, ValidJson},
        models::{
            ApiResponse, Deleted, created,
            applications::{ApplicationCreate, ApplicationResponse, ApplicationUpdate, ListApplicationsQuery},
        },
    },
    db::{
        errors::DbError,
        handlers::{Applications, Repository, applications::ApplicationFilter},
        models::applications::{ApplicationDBResponse, ApplicationUpdateDBRequest},
    },
    errors::Result,
    storage::cleanup::owned_keys,
    types::{ApplicationId, IdOrSlug},
};

const RESOURCE: &str = "Application";

async fn respond(state: &AppState, application: ApplicationDBResponse) -> ApplicationResponse {
    state.signer.sign_document(ApplicationResponse::from(application)).await
}

/// Apply for a job
///
/// Send `multipart/form-data` with the fields and an optional `resume` file (PDF or Word), or
/// plain JSON without a resume. Only one application per job and email address is accepted.
#[utoipa::path(
    post,
    path = "/jobs/{id}/applications",
    tag = "public",
    request_body = ApplicationCreate,
    params(("id" = String, Path, description = "Job id or slug")),
    responses(
        (status = 201, description = "Application received", body = ApiResponse<ApplicationResponse>),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "No open job with this id or slug"),
        (status = 409, description = "Already applied with this email address"),
        (status = 413, description = "Resume too large"),
    )
)]
#[instrument(skip_all)]
pub async fn submit_application(
    State(state): State<AppState>,
    ApiPath(job_ref): ApiPath<IdOrSlug>,
    payload: MediaPayload<ApplicationCreate>,
) -> Result<(StatusCode, ApiResponse<ApplicationResponse>)> {
    let MediaPayload { data, uploads } = payload;

    let result: Result<_> = async {
        let mut tx = state.db.begin().await.map_err(db_error)?;
        let job = find_job(&mut tx, &job_ref)
            .await?
            .filter(|job| job.is_active)
            .ok_or_else(|| not_found("Job", shown(&job_ref)))?;

        let request = data.into_db_request(job.id)?;
        let application = Applications::new(&mut tx).create(&request).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(application)
    }
    .await;
    let application = uploads.release_on_error(&state.cleanup, result)?;

    info!(application_id = %application.id, job_id = %application.job_id, "Received job application");
    Ok(created(respond(&state, application).await))
}

/// List applications
#[utoipa::path(
    get,
    path = "/applications",
    tag = "applications",
    params(ListApplicationsQuery),
    responses(
        (status = 200, description = "Applications, newest first", body = ApiResponse<Vec<ApplicationResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_applications(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListApplicationsQuery>,
) -> Result<ApiResponse<Vec<ApplicationResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = ApplicationFilter {
        job_id: query.job_id,
        status: query.status,
        ..ApplicationFilter::new(skip, limit)
    };
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let applications = Applications::new(&mut conn).list(&filter).await?;

    let applications = state.signer.sign_all(applications.into_iter().map(Into::into).collect()).await;
    Ok(ApiResponse::new(applications))
}

/// Get an application
#[utoipa::path(
    get,
    path = "/applications/{id}",
    tag = "applications",
    params(("id" = uuid::Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application", body = ApiResponse<ApplicationResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_application(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ApplicationId>,
) -> Result<ApiResponse<ApplicationResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let application = Applications::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(RESOURCE, id))?;

    Ok(ApiResponse::new(respond(&state, application).await))
}

/// Move an application through review
#[utoipa::path(
    patch,
    path = "/applications/{id}",
    tag = "applications",
    request_body = ApplicationUpdate,
    params(("id" = uuid::Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "Updated", body = ApiResponse<ApplicationResponse>),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_application(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ApplicationId>,
    ValidJson(data): ValidJson<ApplicationUpdate>,
) -> Result<ApiResponse<ApplicationResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let application = Applications::new(&mut conn)
        .update(id, &ApplicationUpdateDBRequest::from(data))
        .await
        .map_err(|e| match e {
            DbError::NotFound => not_found(RESOURCE, id),
            e => e.into(),
        })?;

    Ok(ApiResponse::new(respond(&state, application).await))
}

/// Delete an application and its resume
#[utoipa::path(
    delete,
    path = "/applications/{id}",
    tag = "applications",
    params(("id" = uuid::Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_application(State(state): State<AppState>, ApiPath(id): ApiPath<ApplicationId>) -> Result<ApiResponse<Deleted>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let application = Applications::new(&mut conn)
        .remove(id)
        .await?
        .ok_or_else(|| not_found(RESOURCE, id))?;

    state.cleanup.enqueue_all(owned_keys(&state.urls, &application));
    Ok(ApiResponse::new(Deleted { deleted: true }))
}
