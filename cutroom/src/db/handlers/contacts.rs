//! Database repository for contact form submissions.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::contacts::{ContactCreateDBRequest, ContactDBResponse, ContactStatus, ContactUpdateDBRequest},
};
use crate::types::{ContactSubmissionId, abbrev_uuid};

/// Filter for listing contact submissions
#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    pub skip: i64,
    pub limit: i64,
    pub status: Option<ContactStatus>,
}

impl ContactFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            status: None,
        }
    }
}

pub struct Contacts<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Contacts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Contacts<'c> {
    type CreateRequest = ContactCreateDBRequest;
    type UpdateRequest = ContactUpdateDBRequest;
    type Response = ContactDBResponse;
    type Id = ContactSubmissionId;
    type Filter = ContactFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let contact = sqlx::query_as::<_, ContactDBResponse>(
            r#"
            INSERT INTO contact_submissions (id, name, email, phone, company, service, budget, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.company)
        .bind(&request.service)
        .bind(&request.budget)
        .bind(&request.message)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(contact)
    }

    #[instrument(skip(self), fields(contact_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let contact = sqlx::query_as::<_, ContactDBResponse>("SELECT * FROM contact_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(contact)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let contacts = sqlx::query_as::<_, ContactDBResponse>(
            r#"
            SELECT * FROM contact_submissions
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.status)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(contacts)
    }

    #[instrument(skip(self), fields(contact_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contact_submissions WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(contact_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let contact = sqlx::query_as::<_, ContactDBResponse>(
            r#"
            UPDATE contact_submissions SET
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

        Ok(contact)
    }
}
