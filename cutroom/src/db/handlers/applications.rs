//! Database repository for job applications.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::applications::{ApplicationCreateDBRequest, ApplicationDBResponse, ApplicationStatus, ApplicationUpdateDBRequest},
};
use crate::types::{ApplicationId, JobId, abbrev_uuid};

/// Filter for listing applications
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub skip: i64,
    pub limit: i64,
    pub job_id: Option<JobId>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

pub struct Applications<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Applications<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Every application for a job, regardless of paging.
    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&job_id)), err)]
    pub async fn all_for_job(&mut self, job_id: JobId) -> Result<Vec<ApplicationDBResponse>> {
        let applications = sqlx::query_as::<_, ApplicationDBResponse>("SELECT * FROM applications WHERE job_id = $1")
            .bind(job_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(applications)
    }

    #[instrument(skip(self), fields(application_id = %abbrev_uuid(&id)), err)]
    pub async fn remove(&mut self, id: ApplicationId) -> Result<Option<ApplicationDBResponse>> {
        let application = sqlx::query_as::<_, ApplicationDBResponse>("DELETE FROM applications WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(application)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Applications<'c> {
    type CreateRequest = ApplicationCreateDBRequest;
    type UpdateRequest = ApplicationUpdateDBRequest;
    type Response = ApplicationDBResponse;
    type Id = ApplicationId;
    type Filter = ApplicationFilter;

    #[instrument(skip(self, request), fields(job_id = %abbrev_uuid(&request.job_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let application = sqlx::query_as::<_, ApplicationDBResponse>(
            r#"
            INSERT INTO applications (id, job_id, name, email, phone, portfolio_url, cover_letter, resume_url, resume_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.job_id)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.portfolio_url)
        .bind(&request.cover_letter)
        .bind(&request.resume_url)
        .bind(&request.resume_key)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(application)
    }

    #[instrument(skip(self), fields(application_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let application = sqlx::query_as::<_, ApplicationDBResponse>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(application)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let applications = sqlx::query_as::<_, ApplicationDBResponse>(
            r#"
            SELECT * FROM applications
            WHERE ($1::uuid IS NULL OR job_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.job_id)
        .bind(filter.status)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(applications)
    }

    #[instrument(skip(self), fields(application_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Ok(self.remove(id).await?.is_some())
    }

    #[instrument(skip(self, request), fields(application_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let application = sqlx::query_as::<_, ApplicationDBResponse>(
            r#"
            UPDATE applications SET
                status = COALESCE($2, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.status)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(application)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Jobs;
    use crate::db::models::jobs::JobCreateDBRequest;
    use sqlx::PgPool;

    async fn create_job(pool: &PgPool, slug: &str) -> JobId {
        let mut conn = pool.acquire().await.unwrap();
        Jobs::new(&mut conn)
            .create(&JobCreateDBRequest {
                title: "Motion Designer".to_string(),
                slug: slug.to_string(),
                department: None,
                location: None,
                employment_type: None,
                description: "Titles and graphics".to_string(),
                requirements: vec![],
                is_active: true,
            })
            .await
            .unwrap()
            .id
    }

    fn application(job_id: JobId, email: &str) -> ApplicationCreateDBRequest {
        ApplicationCreateDBRequest {
            job_id,
            name: "Alex".to_string(),
            email: email.to_string(),
            phone: None,
            portfolio_url: Some("https://vimeo.com/alex".to_string()),
            cover_letter: None,
            resume_url: Some("https://media.example.com/resumes/1-cv.pdf".to_string()),
            resume_key: Some("resumes/1-cv.pdf".to_string()),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_application_rejected(pool: PgPool) {
        let job_id = create_job(&pool, "motion").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Applications::new(&mut conn);

        let created = repo.create(&application(job_id, "alex@example.com")).await.unwrap();
        assert_eq!(created.status, ApplicationStatus::New);

        let err = repo.create(&application(job_id, "alex@example.com")).await.unwrap_err();
        match err {
            DbError::UniqueViolation { constraint, .. } => {
                assert_eq!(constraint.as_deref(), Some("applications_job_id_email_key"))
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_job_is_foreign_key_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let err = Applications::new(&mut conn)
            .create(&application(Uuid::new_v4(), "x@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_status_filter_and_update(pool: PgPool) {
        let job_a = create_job(&pool, "a").await;
        let job_b = create_job(&pool, "b").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Applications::new(&mut conn);

        let first = repo.create(&application(job_a, "one@example.com")).await.unwrap();
        repo.create(&application(job_a, "two@example.com")).await.unwrap();
        repo.create(&application(job_b, "one@example.com")).await.unwrap();

        let updated = repo
            .update(
                first.id,
                &ApplicationUpdateDBRequest {
                    status: Some(ApplicationStatus::Shortlisted),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Shortlisted);

        let for_a = repo
            .list(&ApplicationFilter {
                job_id: Some(job_a),
                ..ApplicationFilter::new(0, 10)
            })
            .await
            .unwrap();
        assert_eq!(for_a.len(), 2);

        let shortlisted = repo
            .list(&ApplicationFilter {
                status: Some(ApplicationStatus::Shortlisted),
                ..ApplicationFilter::new(0, 10)
            })
            .await
            .unwrap();
        assert_eq!(shortlisted.len(), 1);
        assert_eq!(shortlisted[0].id, first.id);

        assert_eq!(repo.all_for_job(job_b).await.unwrap().len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleting_job_cascades(pool: PgPool) {
        let job_id = create_job(&pool, "gone").await;
        let mut conn = pool.acquire().await.unwrap();
        let application = Applications::new(&mut conn)
            .create(&application(job_id, "a@example.com"))
            .await
            .unwrap();

        assert!(Jobs::new(&mut conn).delete(job_id).await.unwrap());
        assert!(Applications::new(&mut conn).get_by_id(application.id).await.unwrap().is_none());
    }
}
