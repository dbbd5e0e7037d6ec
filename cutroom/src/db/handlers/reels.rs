//! Database repository for reels.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::{
        media_binds,
        reels::{ReelCreateDBRequest, ReelDBResponse, ReelUpdateDBRequest},
    },
};
use crate::types::{ReelId, abbrev_uuid};

/// Filter for listing reels
#[derive(Debug, Clone, Default)]
pub struct ReelFilter {
    pub skip: i64,
    pub limit: i64,
    pub active_only: bool,
}

impl ReelFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            active_only: false,
        }
    }
}

pub struct Reels<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Reels<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Read a row and lock it until the surrounding transaction ends, so concurrent media
    /// replacements see each other's writes.
    #[instrument(skip(self), fields(reel_id = %abbrev_uuid(&id)), err)]
    pub async fn get_for_update(&mut self, id: ReelId) -> Result<Option<ReelDBResponse>> {
        let reel = sqlx::query_as::<_, ReelDBResponse>("SELECT * FROM reels WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(reel)
    }

    #[instrument(skip(self), fields(reel_id = %abbrev_uuid(&id)), err)]
    pub async fn remove(&mut self, id: ReelId) -> Result<Option<ReelDBResponse>> {
        let reel = sqlx::query_as::<_, ReelDBResponse>("DELETE FROM reels WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(reel)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Reels<'c> {
    type CreateRequest = ReelCreateDBRequest;
    type UpdateRequest = ReelUpdateDBRequest;
    type Response = ReelDBResponse;
    type Id = ReelId;
    type Filter = ReelFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let reel = sqlx::query_as::<_, ReelDBResponse>(
            r#"
            INSERT INTO reels (id, title, sort_order, is_active, video_url, video_key, thumbnail_url, thumbnail_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.title)
        .bind(request.sort_order)
        .bind(request.is_active)
        .bind(&request.video.url)
        .bind(&request.video.key)
        .bind(&request.thumbnail.url)
        .bind(&request.thumbnail.key)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(reel)
    }

    #[instrument(skip(self), fields(reel_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let reel = sqlx::query_as::<_, ReelDBResponse>("SELECT * FROM reels WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(reel)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let reels = sqlx::query_as::<_, ReelDBResponse>(
            r#"
            SELECT * FROM reels
            WHERE (NOT $1 OR is_active)
            ORDER BY sort_order ASC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.active_only)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(reels)
    }

    #[instrument(skip(self), fields(reel_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Ok(self.remove(id).await?.is_some())
    }

    #[instrument(skip(self, request), fields(reel_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (set_video, video_url, video_key) = media_binds(&request.video);
        let (set_thumbnail, thumbnail_url, thumbnail_key) = media_binds(&request.thumbnail);

        let reel = sqlx::query_as::<_, ReelDBResponse>(
            r#"
            UPDATE reels SET
                title = COALESCE($2, title),
                sort_order = COALESCE($3, sort_order),
                is_active = COALESCE($4, is_active),
                video_url = CASE WHEN $5::boolean THEN $6 ELSE video_url END,
                video_key = CASE WHEN $5::boolean THEN $7 ELSE video_key END,
                thumbnail_url = CASE WHEN $8::boolean THEN $9 ELSE thumbnail_url END,
                thumbnail_key = CASE WHEN $8::boolean THEN $10 ELSE thumbnail_key END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
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

        Ok(reel)
    }
}
