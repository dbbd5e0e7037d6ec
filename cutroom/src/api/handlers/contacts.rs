use axum::{extract::State, http::StatusCode};
use tracing::{info, instrument};

use super::{db_error, not_found};
use crate::{
    AppState,
    api::{
        extract::{ApiPath, ApiQuery, ValidJson},
        models::{
            ApiResponse, Deleted, created,
            contacts::{ContactCreate, ContactResponse, ContactUpdate, ListContactsQuery},
        },
    },
    db::{
        errors::DbError,
        handlers::{Contacts, Repository, contacts::ContactFilter},
        models::contacts::{ContactCreateDBRequest, ContactUpdateDBRequest},
    },
    errors::Result,
    types::ContactSubmissionId,
};

const RESOURCE: &str = "Contact submission";

/// Send the contact form
#[utoipa::path(
    post,
    path = "/contact",
    tag = "public",
    request_body = ContactCreate,
    responses(
        (status = 201, description = "Submission received", body = ApiResponse<ContactResponse>),
        (status = 400, description = "Invalid request"),
    )
)]
#[instrument(skip_all)]
pub async fn submit_contact(
    State(state): State<AppState>,
    ValidJson(data): ValidJson<ContactCreate>,
) -> Result<(StatusCode, ApiResponse<ContactResponse>)> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let submission = Contacts::new(&mut conn).create(&ContactCreateDBRequest::from(data)).await?;

    info!(submission_id = %submission.id, "Received contact submission");
    Ok(created(submission.into()))
}

/// List contact submissions
#[utoipa::path(
    get,
    path = "/contacts",
    tag = "contacts",
    params(ListContactsQuery),
    responses(
        (status = 200, description = "Submissions, newest first", body = ApiResponse<Vec<ContactResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_contacts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListContactsQuery>,
) -> Result<ApiResponse<Vec<ContactResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = ContactFilter {
        status: query.status,
        ..ContactFilter::new(skip, limit)
    };
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let submissions = Contacts::new(&mut conn).list(&filter).await?;

    Ok(ApiResponse::new(submissions.into_iter().map(Into::into).collect()))
}

/// Get a contact submission
#[utoipa::path(
    get,
    path = "/contacts/{id}",
    tag = "contacts",
    params(("id" = uuid::Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission", body = ApiResponse<ContactResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_contact(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ContactSubmissionId>,
) -> Result<ApiResponse<ContactResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let submission = Contacts::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(RESOURCE, id))?;

    Ok(ApiResponse::new(submission.into()))
}

/// Update the triage status of a submission
#[utoipa::path(
    patch,
    path = "/contacts/{id}",
    tag = "contacts",
    request_body = ContactUpdate,
    params(("id" = uuid::Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Updated", body = ApiResponse<ContactResponse>),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_contact(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ContactSubmissionId>,
    ValidJson(data): ValidJson<ContactUpdate>,
) -> Result<ApiResponse<ContactResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let submission = Contacts::new(&mut conn)
        .update(id, &ContactUpdateDBRequest::from(data))
        .await
        .map_err(|e| match e {
            DbError::NotFound => not_found(RESOURCE, id),
            e => e.into(),
        })?;

    Ok(ApiResponse::new(submission.into()))
}

/// Delete a contact submission
#[utoipa::path(
    delete,
    path = "/contacts/{id}",
    tag = "contacts",
    params(("id" = uuid::Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_contact(State(state): State<AppState>, ApiPath(id): ApiPath<ContactSubmissionId>) -> Result<ApiResponse<Deleted>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    if !Contacts::new(&mut conn).delete(id).await? {
        return Err(not_found(RESOURCE, id));
    }

    Ok(ApiResponse::new(Deleted { deleted: true }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    use crate::test_utils::{admin_cookie, create_test_server, create_test_state};

    #[sqlx::test]
    #[test_log::test]
    async fn test_contact_form_and_triage(pool: PgPool) {
        let ctx = create_test_state(pool);
        let server = create_test_server(&ctx.state);
        let cookie = admin_cookie(&ctx.state.config);

        let response = server
            .post("/api/contact")
            .json(&json!({
                "name": " Jordan ",
                "email": "jordan@brand.test",
                "company": "Brand Co",
                "service": "color grading",
                "message": "We need a 30s spot graded by Friday."
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["name"], "Jordan");
        assert_eq!(body["data"]["status"], "new");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        // Submissions are private
        server.get("/admin/api/v1/contacts").await.assert_status(StatusCode::UNAUTHORIZED);

        server
            .patch(&format!("/admin/api/v1/contacts/{id}"))
            .add_header("cookie", cookie.clone())
            .json(&json!({ "status": "replied" }))
            .await
            .assert_status_ok();

        let unread: Value = server
            .get("/admin/api/v1/contacts?status=new")
            .add_header("cookie", cookie.clone())
            .await
            .json();
        assert!(unread["data"].as_array().unwrap().is_empty());

        server
            .delete(&format!("/admin/api/v1/contacts/{id}"))
            .add_header("cookie", cookie.clone())
            .await
            .assert_status_ok();
        server
            .get(&format!("/admin/api/v1/contacts/{id}"))
            .add_header("cookie", cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_submission(pool: PgPool) {
        let ctx = create_test_state(pool);
        let server = create_test_server(&ctx.state);

        let response = server
            .post("/api/contact")
            .json(&json!({ "name": "Jordan", "email": "not-an-email" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        let fields: Vec<&str> = body["fields"].as_array().unwrap().iter().map(|f| f["field"].as_str().unwrap()).collect();
        assert_eq!(fields, vec!["email", "message"]);
    }
}
