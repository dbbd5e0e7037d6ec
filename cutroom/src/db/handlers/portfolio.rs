//! Database repository for portfolio items.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::{
        media_binds,
        portfolio::{PortfolioCreateDBRequest, PortfolioItemDBResponse, PortfolioUpdateDBRequest},
    },
};
use crate::types::{PortfolioItemId, abbrev_uuid};

/// Filter for listing portfolio items
#[derive(Debug, Clone, Default)]
pub struct PortfolioFilter {
    pub skip: i64,
    pub limit: i64,
    /// Hide inactive items (public listing)
    pub active_only: bool,
    pub category: Option<String>,
    pub featured: Option<bool>,
}

impl PortfolioFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

pub struct PortfolioItems<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PortfolioItems<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Read a row and lock it until the surrounding transaction ends, so concurrent media
    /// replacements see each other's writes.
    #[instrument(skip(self), fields(item_id = %abbrev_uuid(&id)), err)]
    pub async fn get_for_update(&mut self, id: PortfolioItemId) -> Result<Option<PortfolioItemDBResponse>> {
        let item = sqlx::query_as::<_, PortfolioItemDBResponse>("SELECT * FROM portfolio_items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(item)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<PortfolioItemDBResponse>> {
        let item = sqlx::query_as::<_, PortfolioItemDBResponse>("SELECT * FROM portfolio_items WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(item)
    }

    /// Delete an item and return the row as it was, so its media can be released.
    #[instrument(skip(self), fields(item_id = %abbrev_uuid(&id)), err)]
    pub async fn remove(&mut self, id: PortfolioItemId) -> Result<Option<PortfolioItemDBResponse>> {
        let item = sqlx::query_as::<_, PortfolioItemDBResponse>("DELETE FROM portfolio_items WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(item)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for PortfolioItems<'c> {
    type CreateRequest = PortfolioCreateDBRequest;
    type UpdateRequest = PortfolioUpdateDBRequest;
    type Response = PortfolioItemDBResponse;
    type Id = PortfolioItemId;
    type Filter = PortfolioFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let item = sqlx::query_as::<_, PortfolioItemDBResponse>(
            r#"
            INSERT INTO portfolio_items (
                id, title, slug, description, category, client, featured, sort_order, is_active,
                video_url, video_key, thumbnail_url, thumbnail_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.category)
        .bind(&request.client)
        .bind(request.featured)
        .bind(request.sort_order)
        .bind(request.is_active)
        .bind(&request.video.url)
        .bind(&request.video.key)
        .bind(&request.thumbnail.url)
        .bind(&request.thumbnail.key)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let item = sqlx::query_as::<_, PortfolioItemDBResponse>("SELECT * FROM portfolio_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(item)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let items = sqlx::query_as::<_, PortfolioItemDBResponse>(
            r#"
            SELECT * FROM portfolio_items
            WHERE (NOT $1 OR is_active)
              AND ($2::text IS NULL OR category = $2)
              AND ($3::boolean IS NULL OR featured = $3)
            ORDER BY sort_order ASC, created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.active_only)
        .bind(&filter.category)
        .bind(filter.featured)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(items)
    }

    #[instrument(skip(self), fields(item_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Ok(self.remove(id).await?.is_some())
    }

    #[instrument(skip(self, request), fields(item_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (set_video, video_url, video_key) = media_binds(&request.video);
        let (set_thumbnail, thumbnail_url, thumbnail_key) = media_binds(&request.thumbnail);

        let item = sqlx::query_as::<_, PortfolioItemDBResponse>(
            r#"
            UPDATE portfolio_items SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                category = COALESCE($5, category),
                client = COALESCE($6, client),
                featured = COALESCE($7, featured),
                sort_order = COALESCE($8, sort_order),
                is_active = COALESCE($9, is_active),
                video_url = CASE WHEN $10::boolean THEN $11 ELSE video_url END,
                video_key = CASE WHEN $10::boolean THEN $12 ELSE video_key END,
                thumbnail_url = CASE WHEN $13::boolean THEN $14 ELSE thumbnail_url END,
                thumbnail_key = CASE WHEN $13::boolean THEN $15 ELSE thumbnail_key END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.category)
        .bind(&request.client)
        .bind(request.featured)
        .bind(request.sort_order)
        .bind(request.is_active)
        .bind(set_video)
        .bind(video_url)
        .bind(video_key)
        .bind(set_thumbnail)
        .bind(thumbnail_url)
        .bind(thumbnail_key)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(item)
    }
}
