//! Admin session endpoints.

use axum::{
    extract::State,
    http::header,
    response::{AppendHeaders, IntoResponse},
};
use tracing::{info, instrument};

use super::db_error;
use crate::{
    AppState,
    api::{
        extract::ValidJson,
        models::{
            ApiResponse,
            users::{CurrentUser, LoginRequest, UserResponse},
        },
    },
    auth::{password, session},
    config::Config,
    db::handlers::{Repository, Users},
    errors::{Error, Result},
};

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    }
}

/// `Set-Cookie` value carrying a session token.
fn session_cookie(token: &str, config: &Config) -> String {
    let session = &config.auth.session;
    cookie(&session.cookie_name, token, session.timeout.as_secs(), config)
}

fn cookie(name: &str, value: &str, max_age: u64, config: &Config) -> String {
    let session = &config.auth.session;
    let mut cookie = format!(
        "{name}={value}; Path=/; HttpOnly; SameSite={}; Max-Age={max_age}",
        session.cookie_same_site
    );
    if session.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful; the session cookie is set", body = ApiResponse<UserResponse>),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, ValidJson(request): ValidJson<LoginRequest>) -> Result<impl IntoResponse> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    let mut users = Users::new(&mut conn);

    let user = users.get_user_by_email(&request.email).await?.ok_or_else(invalid_credentials)?;
    let hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;

    // Verify password on a blocking thread
    let password = request.password;
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;
    if !is_valid {
        return Err(invalid_credentials());
    }

    users.record_login(user.id).await?;
    let user = users.get_by_id(user.id).await?.ok_or_else(invalid_credentials)?;

    let token = session::create_session_token(&CurrentUser::from(&user), &state.config)?;
    info!(user_id = %user.id, "Admin signed in");

    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token, &state.config))]),
        ApiResponse::new(UserResponse::from(user)),
    ))
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

/// Sign out (clears the session cookie)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Session cookie cleared", body = ApiResponse<LogoutResponse>),
    )
)]
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = cookie(&state.config.auth.session.cookie_name, "", 0, &state.config);
    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        ApiResponse::new(LogoutResponse {
            message: "Logout successful".to_string(),
        }),
    )
}

/// The admin the session belongs to
#[utoipa::path(
    get,
    path = "/authentication/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Current admin", body = ApiResponse<UserResponse>),
        (status = 401, description = "No valid session"),
    )
)]
#[instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<ApiResponse<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(db_error)?;
    // The account may have been removed since the token was issued
    let user = Users::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or(Error::Unauthenticated { message: None })?;

    Ok(ApiResponse::new(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use sqlx::PgPool;

    use crate::test_utils::{admin_cookie, create_test_admin, create_test_server, create_test_state, session_cookie};

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_sets_cookie_and_me_works(pool: PgPool) {
        let ctx = create_test_state(pool.clone());
        create_test_admin(&pool, "editor@studio.test", "correct horse").await;
        let server = create_test_server(&ctx.state);

        let response = server
            .post("/authentication/login")
            .json(&serde_json::json!({ "email": "Editor@Studio.test", "password": "correct horse" }))
            .await;
        response.assert_status_ok();

        let set_cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap().to_string();
        assert!(set_cookie.starts_with("cutroom_session="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains(&format!("Max-Age={}", 7 * 24 * 3600)));

        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["email"], "editor@studio.test");
        assert!(body["data"]["lastLogin"].is_string());

        let cookie = set_cookie.split(';').next().unwrap().to_string();
        let me = server.get("/authentication/me").add_header("cookie", cookie).await;
        me.assert_status_ok();
        assert_eq!(me.json::<serde_json::Value>()["data"]["email"], "editor@studio.test");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_wrong_password_is_unauthorized(pool: PgPool) {
        let ctx = create_test_state(pool.clone());
        create_test_admin(&pool, "editor@studio.test", "correct horse").await;
        let server = create_test_server(&ctx.state);

        for (email, password) in [("editor@studio.test", "wrong"), ("nobody@studio.test", "correct horse")] {
            let response = server
                .post("/authentication/login")
                .json(&serde_json::json!({ "email": email, "password": password }))
                .await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            let body: serde_json::Value = response.json();
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "Invalid email or password");
            assert!(response.headers().get("set-cookie").is_none());
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_malformed_login_uses_envelope(pool: PgPool) {
        let ctx = create_test_state(pool);
        let server = create_test_server(&ctx.state);

        let response = server
            .post("/authentication/login")
            .add_header("Content-Type", "application/json")
            .bytes("{not json".as_bytes().into())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<serde_json::Value>()["success"], false);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_requires_live_account(pool: PgPool) {
        let ctx = create_test_state(pool.clone());
        let server = create_test_server(&ctx.state);

        server.get("/authentication/me").await.assert_status(StatusCode::UNAUTHORIZED);

        // Valid token for an account that does not exist
        server
            .get("/authentication/me")
            .add_header("cookie", admin_cookie(&ctx.state.config))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let admin = create_test_admin(&pool, "a@studio.test", "pw").await;
        let cookie = session_cookie(&ctx.state.config, &(&admin).into());
        server.get("/authentication/me").add_header("cookie", cookie).await.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_logout_expires_cookie(pool: PgPool) {
        let ctx = create_test_state(pool);
        let server = create_test_server(&ctx.state);

        let response = server.post("/authentication/logout").await;
        response.assert_status_ok();
        let set_cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap().to_string();
        assert!(set_cookie.starts_with("cutroom_session=;"));
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
