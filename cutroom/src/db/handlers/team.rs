//! Database repository for team members.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::{
        media_binds,
        team::{TeamMemberCreateDBRequest, TeamMemberDBResponse, TeamMemberUpdateDBRequest},
    },
};
use crate::types::{TeamMemberId, abbrev_uuid};

/// Filter for listing team members
#[derive(Debug, Clone, Default)]
pub struct TeamFilter {
    pub skip: i64,
    pub limit: i64,
    pub active_only: bool,
}

impl TeamFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            active_only: false,
        }
    }
}

pub struct TeamMembers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> TeamMembers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Read a row and lock it until the surrounding transaction ends, so concurrent media
    /// replacements see each other's writes.
    #[instrument(skip(self), fields(member_id = %abbrev_uuid(&id)), err)]
    pub async fn get_for_update(&mut self, id: TeamMemberId) -> Result<Option<TeamMemberDBResponse>> {
        let member = sqlx::query_as::<_, TeamMemberDBResponse>("SELECT * FROM team_members WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(member)
    }

    #[instrument(skip(self), fields(member_id = %abbrev_uuid(&id)), err)]
    pub async fn remove(&mut self, id: TeamMemberId) -> Result<Option<TeamMemberDBResponse>> {
        let member = sqlx::query_as::<_, TeamMemberDBResponse>("DELETE FROM team_members WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(member)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for TeamMembers<'c> {
    type CreateRequest = TeamMemberCreateDBRequest;
    type UpdateRequest = TeamMemberUpdateDBRequest;
    type Response = TeamMemberDBResponse;
    type Id = TeamMemberId;
    type Filter = TeamFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let member = sqlx::query_as::<_, TeamMemberDBResponse>(
            r#"
            INSERT INTO team_members (id, name, position, bio, sort_order, is_active, image_url, image_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.position)
        .bind(&request.bio)
        .bind(request.sort_order)
        .bind(request.is_active)
        .bind(&request.image.url)
        .bind(&request.image.key)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(member)
    }

    #[instrument(skip(self), fields(member_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let member = sqlx::query_as::<_, TeamMemberDBResponse>("SELECT * FROM team_members WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(member)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let members = sqlx::query_as::<_, TeamMemberDBResponse>(
            r#"
            SELECT * FROM team_members
            WHERE (NOT $1 OR is_active)
            ORDER BY sort_order ASC, created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.active_only)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(members)
    }

    #[instrument(skip(self), fields(member_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Ok(self.remove(id).await?.is_some())
    }

    #[instrument(skip(self, request), fields(member_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (set_image, image_url, image_key) = media_binds(&request.image);

        let member = sqlx::query_as::<_, TeamMemberDBResponse>(
            r#"
            UPDATE team_members SET
                name = COALESCE($2, name),
                position = COALESCE($3, position),
                bio = COALESCE($4, bio),
                sort_order = COALESCE($5, sort_order),
                is_active = COALESCE($6, is_active),
                image_url = CASE WHEN $7::boolean THEN $8 ELSE image_url END,
                image_key = CASE WHEN $7::boolean THEN $9 ELSE image_key END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.position)
        .bind(&request.bio)
        .bind(request.sort_order)
        .bind(request.is_active)
        .bind(set_image)
        .bind(image_url)
        .bind(image_key)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(member)
    }
}
