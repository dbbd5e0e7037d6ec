use axum::{extract::State, http::StatusCode};
use tracing::{info, instrument};

use super::{db_error, not_found};
use crate::{
    AppState,
    api::{
        extract::{ApiPath, ApiQuery, ValidJson},
        models::{
            ApiResponse, Deleted, created,
            jobs::{JobCreate, JobResponse, JobUpdate},
            pagination::Pagination,
        },
    },
    db::{
        errors::DbError,
        handlers::{Applications, Jobs, Repository, jobs::JobFilter},
        models::jobs::{JobCreateDBRequest, JobDBResponse, JobUpdateDBRequest},
    },
    errors::Result,
    storage::cleanup::owned_keys,
    types::{IdOrSlug, JobId},
};

const RESOURCE: &str = "Job";

/// Look up a job by id or slug.
pub(crate) async fn find_job(conn: &mut sqlx::PgConnection, id: &IdOrSlug) -> Result<Option<JobDBResponse>> {
    let mut repo = Jobs::new(conn);
    Ok(match id {
        IdOrSlug::Id(id) => repo.get_by_id(*id).await?,
        IdOrSlug::Slug(slug) => repo.get_by_slug(slug).await?,
    })
}

pub(crate) fn shown(id: &IdOrSlug) -> String {
    match id {
        IdOrSlug::Id(id) => id.to_string(),
        IdOrSlug::Slug(slug) => slug.clone(),
    }
}

/// List open positions
#[utoipa::path(
    get,
    path = "/jobs",
    tag = "public",
    params(Pagination),
    responses(
        (status = 200, description = "Active job postings, newest first", body = ApiResponse<Vec<JobResponse>>),
    )
)]
#[instrument(skip_all)]
pub async fn list_public_jobs(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<ApiResponse<Vec<JobResponse>>> {
    let (skip, limit) = pagination.params();
    let filter = JobFilter {
        active_only: true,
        ..JobFilter::new(skip, limit)
    };
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let jobs = Jobs::new(&mut conn).list(&filter).await?;

    Ok(ApiResponse::new(jobs.into_iter().map(Into::into).collect()))
}

/// Get an open position by id or slug
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = "public",
    params(("id" = String, Path, description = "Job id or slug")),
    responses(
        (status = 200, description = "Job posting", body = ApiResponse<JobResponse>),
        (status = 404, description = "No active job with this id or slug"),
    )
)]
#[instrument(skip_all)]
pub async fn get_public_job(State(state): State<AppState>, ApiPath(id): ApiPath<IdOrSlug>) -> Result<ApiResponse<JobResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let job = find_job(&mut conn, &id)
        .await?
        .filter(|job| job.is_active)
        .ok_or_else(|| not_found(RESOURCE, shown(&id)))?;

    Ok(ApiResponse::new(job.into()))
}

/// List job postings
#[utoipa::path(
    get,
    path = "/jobs",
    tag = "jobs",
    params(Pagination),
    responses(
        (status = 200, description = "All job postings, newest first", body = ApiResponse<Vec<JobResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_jobs(State(state): State<AppState>, ApiQuery(pagination): ApiQuery<Pagination>) -> Result<ApiResponse<Vec<JobResponse>>> {
    let (skip, limit) = pagination.params();
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let jobs = Jobs::new(&mut conn).list(&JobFilter::new(skip, limit)).await?;

    Ok(ApiResponse::new(jobs.into_iter().map(Into::into).collect()))
}

/// Get a job posting
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = "jobs",
    params(("id" = uuid::Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job posting", body = ApiResponse<JobResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_job(State(state): State<AppState>, ApiPath(id): ApiPath<JobId>) -> Result<ApiResponse<JobResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let job = Jobs::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found(RESOURCE, id))?;

    Ok(ApiResponse::new(job.into()))
}

/// Create a job posting
#[utoipa::path(
    post,
    path = "/jobs",
    tag = "jobs",
    request_body = JobCreate,
    responses(
        (status = 201, description = "Created", body = ApiResponse<JobResponse>),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Slug already in use"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_job(State(state): State<AppState>, ValidJson(data): ValidJson<JobCreate>) -> Result<(StatusCode, ApiResponse<JobResponse>)> {
    let request = JobCreateDBRequest::try_from(data)?;
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let job = Jobs::new(&mut conn).create(&request).await?;

    info!(job_id = %job.id, slug = %job.slug, "Created job posting");
    Ok(created(job.into()))
}

/// Update a job posting
#[utoipa::path(
    patch,
    path = "/jobs/{id}",
    tag = "jobs",
    request_body = JobUpdate,
    params(("id" = uuid::Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Updated", body = ApiResponse<JobResponse>),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Slug already in use"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_job(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<JobId>,
    ValidJson(data): ValidJson<JobUpdate>,
) -> Result<ApiResponse<JobResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let job = Jobs::new(&mut conn)
        .update(id, &JobUpdateDBRequest::from(data))
        .await
        .map_err(|e| match e {
            DbError::NotFound => not_found(RESOURCE, id),
            e => e.into(),
        })?;

    Ok(ApiResponse::new(job.into()))
}

/// Delete a job posting
///
/// Applications to the job are deleted with it, and their resumes removed from storage.
#[utoipa::path(
    delete,
    path = "/jobs/{id}",
    tag = "jobs",
    params(("id" = uuid::Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_job(State(state): State<AppState>, ApiPath(id): ApiPath<JobId>) -> Result<ApiResponse<Deleted>> {
    let mut tx = state.db.begin().await.map_err(db_error)?;

    let applications = Applications::new(&mut tx).all_for_job(id).await?;
    if !Jobs::new(&mut tx).delete(id).await? {
        return Err(not_found(RESOURCE, id));
    }
    tx.commit().await.map_err(db_error)?;

    state
        .cleanup
        .enqueue_all(applications.iter().flat_map(|application| owned_keys(&state.urls, application)));
    info!(job_id = %id, applications = applications.len(), "Deleted job posting");
    Ok(ApiResponse::new(Deleted { deleted: true }))
}
