//! Database repository for job postings.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::jobs::{JobCreateDBRequest, JobDBResponse, JobUpdateDBRequest},
};
use crate::types::{JobId, abbrev_uuid};

/// Filter for listing job postings
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub skip: i64,
    pub limit: i64,
    pub active_only: bool,
}

impl JobFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            active_only: false,
        }
    }
}

pub struct Jobs<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Jobs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<JobDBResponse>> {
        let job = sqlx::query_as::<_, JobDBResponse>("SELECT * FROM jobs WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(job)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Jobs<'c> {
    type CreateRequest = JobCreateDBRequest;
    type UpdateRequest = JobUpdateDBRequest;
    type Response = JobDBResponse;
    type Id = JobId;
    type Filter = JobFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let job = sqlx::query_as::<_, JobDBResponse>(
            r#"
            INSERT INTO jobs (id, title, slug, department, location, employment_type, description, requirements, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.department)
        .bind(&request.location)
        .bind(&request.employment_type)
        .bind(&request.description)
        .bind(&request.requirements)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(job)
    }

    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let job = sqlx::query_as::<_, JobDBResponse>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(job)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let jobs = sqlx::query_as::<_, JobDBResponse>(
            r#"
            SELECT * FROM jobs
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

        Ok(jobs)
    }

    /// Applications go with the job (ON DELETE CASCADE); release their resumes first with
    /// [`Applications::all_for_job`](super::Applications::all_for_job).
    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(job_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let job = sqlx::query_as::<_, JobDBResponse>(
            r#"
            UPDATE jobs SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                department = COALESCE($4, department),
                location = COALESCE($5, location),
                employment_type = COALESCE($6, employment_type),
                description = COALESCE($7, description),
                requirements = COALESCE($8, requirements),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.department)
        .bind(&request.location)
        .bind(&request.employment_type)
        .bind(&request.description)
        .bind(&request.requirements)
        .bind(request.is_active)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(job)
    }
}
