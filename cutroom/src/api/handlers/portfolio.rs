use axum::{extract::State, http::StatusCode};
use tracing::{info, instrument};

use super::{db_error, not_found};
use crate::{
    AppState,
    api::{
        extract::{ApiPath, ApiQuery, MediaPayload},
        models::{
            ApiResponse, Deleted, created,
            portfolio::{ListPortfolioQuery, PortfolioCreate, PortfolioItemResponse, PortfolioUpdate},
        },
    },
    db::{
        handlers::{PortfolioItems, Repository, portfolio::PortfolioFilter},
        models::portfolio::{PortfolioCreateDBRequest, PortfolioItemDBResponse, PortfolioUpdateDBRequest},
    },
    errors::Result,
    storage::cleanup::{owned_keys, replaced_keys},
    types::{IdOrSlug, PortfolioItemId},
};

const RESOURCE: &str = "Portfolio item";

async fn respond(state: &AppState, item: PortfolioItemDBResponse) -> PortfolioItemResponse {
    state.signer.sign_document(PortfolioItemResponse::from(item)).await
}

fn filter(query: &ListPortfolioQuery, active_only: bool) -> PortfolioFilter {
    let (skip, limit) = query.pagination.params();
    PortfolioFilter {
        active_only,
        category: query.category.clone(),
        featured: query.featured,
        ..PortfolioFilter::new(skip, limit)
    }
}

/// List active portfolio items
#[utoipa::path(
    get,
    path = "/portfolio",
    tag = "public",
    params(ListPortfolioQuery),
    responses(
        (status = 200, description = "Active items ordered by sort order, newest first", body = ApiResponse<Vec<PortfolioItemResponse>>),
    )
)]
#[instrument(skip_all)]
pub async fn list_public_portfolio(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPortfolioQuery>,
) -> Result<ApiResponse<Vec<PortfolioItemResponse>>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let items = PortfolioItems::new(&mut conn).list(&filter(&query, true)).await?;

    let items = state.signer.sign_all(items.into_iter().map(Into::into).collect()).await;
    Ok(ApiResponse::new(items))
}

/// Get an active portfolio item by id or slug
#[utoipa::path(
    get,
    path = "/portfolio/{id}",
    tag = "public",
    params(("id" = String, Path, description = "Item id or slug")),
    responses(
        (status = 200, description = "Portfolio item", body = ApiResponse<PortfolioItemResponse>),
        (status = 404, description = "No active item with this id or slug"),
    )
)]
#[instrument(skip_all)]
pub async fn get_public_portfolio_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<IdOrSlug>,
) -> Result<ApiResponse<PortfolioItemResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let mut repo = PortfolioItems::new(&mut conn);

    let (item, shown) = match &id {
        IdOrSlug::Id(id) => (repo.get_by_id(*id).await?, id.to_string()),
        IdOrSlug::Slug(slug) => (repo.get_by_slug(slug).await?, slug.clone()),
    };
    let item = item.filter(|item| item.is_active).ok_or_else(|| not_found(RESOURCE, shown))?;

    Ok(ApiResponse::new(respond(&state, item).await))
}

/// List portfolio items
#[utoipa::path(
    get,
    path = "/portfolio",
    tag = "portfolio",
    params(ListPortfolioQuery),
    responses(
        (status = 200, description = "All items, including inactive ones", body = ApiResponse<Vec<PortfolioItemResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_portfolio(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPortfolioQuery>,
) -> Result<ApiResponse<Vec<PortfolioItemResponse>>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let items = PortfolioItems::new(&mut conn).list(&filter(&query, false)).await?;

    let items = state.signer.sign_all(items.into_iter().map(Into::into).collect()).await;
    Ok(ApiResponse::new(items))
}

/// Get a portfolio item
#[utoipa::path(
    get,
    path = "/portfolio/{id}",
    tag = "portfolio",
    params(("id" = uuid::Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Portfolio item", body = ApiResponse<PortfolioItemResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_portfolio_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PortfolioItemId>,
) -> Result<ApiResponse<PortfolioItemResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let item = PortfolioItems::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(RESOURCE, id))?;

    Ok(ApiResponse::new(respond(&state, item).await))
}

/// Create a portfolio item
///
/// Accepts JSON with presigned upload results, or `multipart/form-data` with `video` and
/// `thumbnail` file parts.
#[utoipa::path(
    post,
    path = "/portfolio",
    tag = "portfolio",
    request_body = PortfolioCreate,
    responses(
        (status = 201, description = "Created", body = ApiResponse<PortfolioItemResponse>),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Slug already in use"),
        (status = 413, description = "Upload too large"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_portfolio_item(
    State(state): State<AppState>,
    payload: MediaPayload<PortfolioCreate>,
) -> Result<(StatusCode, ApiResponse<PortfolioItemResponse>)> {
    let MediaPayload { data, uploads } = payload;

    let result: Result<_> = async {
        let request = PortfolioCreateDBRequest::try_from(data)?;
        let mut conn = state.db.acquire().await.map_err(db_error)?;
        Ok(PortfolioItems::new(&mut conn).create(&request).await?)
    }
    .await;
    let item = uploads.release_on_error(&state.cleanup, result)?;

    info!(item_id = %item.id, slug = %item.slug, "Created portfolio item");
    Ok(created(respond(&state, item).await))
}

/// Update a portfolio item
///
/// Omitted fields are left unchanged. Media that is replaced or cleared is deleted from storage.
#[utoipa::path(
    patch,
    path = "/portfolio/{id}",
    tag = "portfolio",
    request_body = PortfolioUpdate,
    params(("id" = uuid::Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Updated", body = ApiResponse<PortfolioItemResponse>),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Slug already in use"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_portfolio_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PortfolioItemId>,
    payload: MediaPayload<PortfolioUpdate>,
) -> Result<ApiResponse<PortfolioItemResponse>> {
    let MediaPayload { data, uploads } = payload;

    let result: Result<_> = async {
        let request = PortfolioUpdateDBRequest::try_from(data)?;
        let mut tx = state.db.begin().await.map_err(db_error)?;
        let mut repo = PortfolioItems::new(&mut tx);

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

/// Delete a portfolio item and its media
#[utoipa::path(
    delete,
    path = "/portfolio/{id}",
    tag = "portfolio",
    params(("id" = uuid::Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_portfolio_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PortfolioItemId>,
) -> Result<ApiResponse<Deleted>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let item = PortfolioItems::new(&mut conn)
        .remove(id)
        .await?
        .ok_or_else(|| not_found(RESOURCE, id))?;

    state.cleanup.enqueue_all(owned_keys(&state.urls, &item));
    info!(slug = %item.slug, "Deleted portfolio item");
    Ok(ApiResponse::new(Deleted { deleted: true }))
}
