//! Database repository for showreels.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::{
        media_binds,
        showreels::{ShowreelCreateDBRequest, ShowreelDBResponse, ShowreelUpdateDBRequest},
    },
};
use crate::types::{ShowreelId, abbrev_uuid};

/// Filter for listing showreels
#[derive(Debug, Clone, Default)]
pub struct ShowreelFilter {
    pub skip: i64,
    pub limit: i64,
    pub active_only: bool,
}

impl ShowreelFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            active_only: false,
        }
    }
}

pub struct Showreels<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Showreels<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Read a row and lock it until the surrounding transaction ends, so concurrent media
    /// replacements see each other's writes.
    #[instrument(skip(self), fields(showreel_id = %abbrev_uuid(&id)), err)]
    pub async fn get_for_update(&mut self, id: ShowreelId) -> Result<Option<ShowreelDBResponse>> {
        let reel = sqlx::query_as::<_, ShowreelDBResponse>("SELECT * FROM showreels WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(reel)
    }

    /// The showreel the public site plays: the most recently created active one.
    #[instrument(skip(self), err)]
    pub async fn latest_active(&mut self) -> Result<Option<ShowreelDBResponse>> {
        let reel = sqlx::query_as::<_, ShowreelDBResponse>(
            "SELECT * FROM showreels WHERE is_active ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(reel)
    }

    #[instrument(skip(self), fields(showreel_id = %abbrev_uuid(&id)), err)]
    pub async fn remove(&mut self, id: ShowreelId) -> Result<Option<ShowreelDBResponse>> {
        let reel = sqlx::query_as::<_, ShowreelDBResponse>("DELETE FROM showreels WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(reel)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Showreels<'c> {
    type CreateRequest = ShowreelCreateDBRequest;
    type UpdateRequest = ShowreelUpdateDBRequest;
    type Response = ShowreelDBResponse;
    type Id = ShowreelId;
    type Filter = ShowreelFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let reel = sqlx::query_as::<_, ShowreelDBResponse>(
            r#"
            INSERT INTO showreels (id, title, description, is_active, video_url, video_key, thumbnail_url, thumbnail_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.is_active)
        .bind(&request.video.url)
        .bind(&request.video.key)
        .bind(&request.thumbnail.url)
        .bind(&request.thumbnail.key)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(reel)
    }

    #[instrument(skip(self), fields(showreel_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let reel = sqlx::query_as::<_, ShowreelDBResponse>("SELECT * FROM showreels WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(reel)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let reels = sqlx::query_as::<_, ShowreelDBResponse>(
            r#"
            SELECT * FROM showreels
            WHERE (NOT $1 OR is_active)
            ORDER BY created_at DESC
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

    #[instrument(skip(self), fields(showreel_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Ok(self.remove(id).await?.is_some())
    }

    #[instrument(skip(self, request), fields(showreel_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (set_video, video_url, video_key) = media_binds(&request.video);
        let (set_thumbnail, thumbnail_url, thumbnail_key) = media_binds(&request.thumbnail);

        let reel = sqlx::query_as::<_, ShowreelDBResponse>(
            r#"
            UPDATE showreels SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
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
        .bind(&request.description)
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
