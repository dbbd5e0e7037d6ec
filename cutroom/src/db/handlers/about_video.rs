//! Database repository for the about-page video.
//!
//! The table holds at most one row, so this repository does not implement
//! [`Repository`](super::Repository): there is nothing to list and no id to look up by.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::Result,
    models::{
        about_video::{AboutVideoDBResponse, AboutVideoUpsertDBRequest},
        media_binds,
    },
};

pub struct AboutVideos<'c> {
    db: &'c mut PgConnection,
}

impl<'c> AboutVideos<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get(&mut self) -> Result<Option<AboutVideoDBResponse>> {
        let video = sqlx::query_as::<_, AboutVideoDBResponse>(
            r#"
            SELECT id, title, description, video_url, video_key, thumbnail_url, thumbnail_key, created_at, updated_at
            FROM about_video
            "#,
        )
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(video)
    }

    /// Like [`get`](Self::get), but serializes writers for the rest of the transaction. The lock
    /// is taken even when no row exists yet, so two first writes cannot both see an empty table.
    #[instrument(skip(self), err)]
    pub async fn get_for_update(&mut self) -> Result<Option<AboutVideoDBResponse>> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('about_video'))")
            .execute(&mut *self.db)
            .await?;
        self.get().await
    }

    /// Create the row or replace its content. Media not included in the request is kept.
    #[instrument(skip(self, request), fields(title = %request.title), err)]
    pub async fn upsert(&mut self, request: &AboutVideoUpsertDBRequest) -> Result<AboutVideoDBResponse> {
        let (set_video, video_url, video_key) = media_binds(&request.video);
        let (set_thumbnail, thumbnail_url, thumbnail_key) = media_binds(&request.thumbnail);

        let video = sqlx::query_as::<_, AboutVideoDBResponse>(
            r#"
            INSERT INTO about_video (id, title, description, video_url, video_key, thumbnail_url, thumbnail_key)
            VALUES ($1, $2, $3, $5, $6, $8, $9)
            ON CONFLICT (singleton) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                video_url = CASE WHEN $4::boolean THEN EXCLUDED.video_url ELSE about_video.video_url END,
                video_key = CASE WHEN $4::boolean THEN EXCLUDED.video_key ELSE about_video.video_key END,
                thumbnail_url = CASE WHEN $7::boolean THEN EXCLUDED.thumbnail_url ELSE about_video.thumbnail_url END,
                thumbnail_key = CASE WHEN $7::boolean THEN EXCLUDED.thumbnail_key ELSE about_video.thumbnail_key END,
                updated_at = NOW()
            RETURNING id, title, description, video_url, video_key, thumbnail_url, thumbnail_key, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.title)
        .bind(&request.description)
        .bind(set_video)
        .bind(video_url)
        .bind(video_key)
        .bind(set_thumbnail)
        .bind(thumbnail_url)
        .bind(thumbnail_key)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(video)
    }

    #[instrument(skip(self), err)]
    pub async fn remove(&mut self) -> Result<Option<AboutVideoDBResponse>> {
        let video = sqlx::query_as::<_, AboutVideoDBResponse>(
            r#"
            DELETE FROM about_video
            RETURNING id, title, description, video_url, video_key, thumbnail_url, thumbnail_key, created_at, updated_at
            "#,
        )
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(video)
    }
}
