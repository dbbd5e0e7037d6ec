use axum::{extract::State, http::StatusCode};
use tracing::{info, instrument};

use super::{db_error, not_found};
use crate::{
    AppState,
    api::{
        extract::{ApiPath, ApiQuery, MediaPayload},
        models::{
            ApiResponse, Deleted, created,
            pagination::Pagination,
            team::{TeamMemberCreate, TeamMemberResponse, TeamMemberUpdate},
        },
    },
    db::{
        handlers::{Repository, TeamMembers, team::TeamFilter},
        models::team::{TeamMemberCreateDBRequest, TeamMemberDBResponse, TeamMemberUpdateDBRequest},
    },
    errors::Result,
    storage::cleanup::{owned_keys, replaced_keys},
    types::TeamMemberId,
};

const RESOURCE: &str = "Team member";

async fn respond(state: &AppState, member: TeamMemberDBResponse) -> TeamMemberResponse {
    state.signer.sign_document(TeamMemberResponse::from(member)).await
}

/// List active team members
#[utoipa::path(
    get,
    path = "/team",
    tag = "public",
    params(Pagination),
    responses(
        (status = 200, description = "Active team members in display order", body = ApiResponse<Vec<TeamMemberResponse>>),
    )
)]
#[instrument(skip_all)]
pub async fn list_public_team(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<ApiResponse<Vec<TeamMemberResponse>>> {
    let (skip, limit) = pagination.params();
    let filter = TeamFilter {
        active_only: true,
        ..TeamFilter::new(skip, limit)
    };
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let members = TeamMembers::new(&mut conn).list(&filter).await?;

    let members = state.signer.sign_all(members.into_iter().map(Into::into).collect()).await;
    Ok(ApiResponse::new(members))
}

/// List team members
#[utoipa::path(
    get,
    path = "/team",
    tag = "team",
    params(Pagination),
    responses(
        (status = 200, description = "All team members in display order", body = ApiResponse<Vec<TeamMemberResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_team(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<ApiResponse<Vec<TeamMemberResponse>>> {
    let (skip, limit) = pagination.params();
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let members = TeamMembers::new(&mut conn).list(&TeamFilter::new(skip, limit)).await?;

    let members = state.signer.sign_all(members.into_iter().map(Into::into).collect()).await;
    Ok(ApiResponse::new(members))
}

/// Get a team member
#[utoipa::path(
    get,
    path = "/team/{id}",
    tag = "team",
    params(("id" = uuid::Uuid, Path, description = "Team member id")),
    responses(
        (status = 200, description = "Team member", body = ApiResponse<TeamMemberResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_team_member(State(state): State<AppState>, ApiPath(id): ApiPath<TeamMemberId>) -> Result<ApiResponse<TeamMemberResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let member = TeamMembers::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(RESOURCE, id))?;

    Ok(ApiResponse::new(respond(&state, member).await))
}

/// Create a team member
///
/// Accepts JSON with presigned upload results, or `multipart/form-data` with an `image` file part.
#[utoipa::path(
    post,
    path = "/team",
    tag = "team",
    request_body = TeamMemberCreate,
    responses(
        (status = 201, description = "Created", body = ApiResponse<TeamMemberResponse>),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "Upload too large"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_team_member(
    State(state): State<AppState>,
    payload: MediaPayload<TeamMemberCreate>,
) -> Result<(StatusCode, ApiResponse<TeamMemberResponse>)> {
    let MediaPayload { data, uploads } = payload;

    let result: Result<_> = async {
        let request = TeamMemberCreateDBRequest::try_from(data)?;
        let mut conn = state.db.acquire().await.map_err(db_error)?;
        Ok(TeamMembers::new(&mut conn).create(&request).await?)
    }
    .await;
    let member = uploads.release_on_error(&state.cleanup, result)?;

    info!(member_id = %member.id, "Created team member");
    Ok(created(respond(&state, member).await))
}

/// Update a team member
#[utoipa::path(
    patch,
    path = "/team/{id}",
    tag = "team",
    request_body = TeamMemberUpdate,
    params(("id" = uuid::Uuid, Path, description = "Team member id")),
    responses(
        (status = 200, description = "Updated", body = ApiResponse<TeamMemberResponse>),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_team_member(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TeamMemberId>,
    payload: MediaPayload<TeamMemberUpdate>,
) -> Result<ApiResponse<TeamMemberResponse>> {
    let MediaPayload { data, uploads } = payload;

    let result: Result<_> = async {
        let request = TeamMemberUpdateDBRequest::try_from(data)?;
        let mut tx = state.db.begin().await.map_err(db_error)?;
        let mut repo = TeamMembers::new(&mut tx);

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

/// Delete a team member and their photo
#[utoipa::path(
    delete,
    path = "/team/{id}",
    tag = "team",
    params(("id" = uuid::Uuid, Path, description = "Team member id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_team_member(State(state): State<AppState>, ApiPath(id): ApiPath<TeamMemberId>) -> Result<ApiResponse<Deleted>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let member = TeamMembers::new(&mut conn)
        .remove(id)
        .await?
        .ok_or_else(|| not_found(RESOURCE, id))?;

    state.cleanup.enqueue_all(owned_keys(&state.urls, &member));
    info!(member_id = %id, "Deleted team member");
    Ok(ApiResponse::new(Deleted { deleted: true }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{Value, json};
    use sqlx::PgPool;

    use crate::test_utils::{admin_cookie, create_test_server, create_test_state};

    #[sqlx::test]
    #[test_log::test]
    async fn test_team_lifecycle(pool: PgPool) {
        let ctx = create_test_state(pool);
        let server = create_test_server(&ctx.state);
        let cookie = admin_cookie(&ctx.state.config);

        let response = server
            .post("/admin/api/v1/team")
            .add_header("cookie", cookie.clone())
            .multipart(
                MultipartForm::new()
                    .add_text("name", "Sam Rivera")
                    .add_text("position", "Lead Colorist")
                    .add_text("sortOrder", "1")
                    .add_part("image", Part::bytes(b"jpg".as_slice()).file_name("sam.jpg").mime_type("image/jpeg")),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: Value = response.json();
        let id = created["data"]["id"].as_str().unwrap().to_string();
        let image_key = created["data"]["imageKey"].as_str().unwrap().to_string();
        assert!(image_key.starts_with("team/") && image_key.ends_with("-sam.jpg"));

        server
            .post("/admin/api/v1/team")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "name": "Former", "position": "Assistant", "isActive": false }))
            .await
            .assert_status(StatusCode::CREATED);

        let public: Value = server.get("/api/team").await.json();
        let members = public["data"].as_array().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["name"], "Sam Rivera");

        // An empty URL clears the photo
        let response = server
            .patch(&format!("/admin/api/v1/team/{id}"))
            .add_header("cookie", cookie.clone())
            .json(&json!({ "imageUrl": "" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["data"]["imageUrl"], Value::Null);

        server
            .delete(&format!("/admin/api/v1/team/{id}"))
            .add_header("cookie", cookie)
            .await
            .assert_status_ok();

        assert_eq!(ctx.drain_cleanup().await, vec![image_key]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_fields_are_reported_together(pool: PgPool) {
        let ctx = create_test_state(pool);
        let server = create_test_server(&ctx.state);

        let response = server
            .post("/admin/api/v1/team")
            .add_header("cookie", admin_cookie(&ctx.state.config))
            .json(&json!({ "bio": "No name" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        let fields: Vec<&str> = body["fields"].as_array().unwrap().iter().map(|f| f["field"].as_str().unwrap()).collect();
        assert_eq!(fields, vec!["name", "position"]);
        assert!(ctx.store.calls().is_empty());
    }
}
