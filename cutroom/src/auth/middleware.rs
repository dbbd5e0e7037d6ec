use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, trace};

use crate::{AppState, auth::current_user::try_session_cookie_auth, errors::Error};

/// Authenticate the admin session cookie. On success the [`CurrentUser`] is stored in the
/// request extensions for downstream extractors.
///
/// [`CurrentUser`]: crate::api::models::users::CurrentUser
pub(crate) fn admin_session(state: &AppState, mut request: Request) -> Result<Request, Error> {
    let (mut parts, body) = request.into_parts();

    let user = match try_session_cookie_auth(&parts, &state.config) {
        Some(Ok(user)) => user,
        Some(Err(e)) => {
            debug!(path = %parts.uri.path(), "Rejected admin request with invalid session: {e}");
            return Err(Error::Unauthenticated { message: None });
        }
        None => {
            debug!(path = %parts.uri.path(), "Rejected admin request without session");
            return Err(Error::Unauthenticated { message: None });
        }
    };

    trace!("Authenticated admin: {}", user.email);
    parts.extensions.insert(user);
    request = Request::from_parts(parts, body);
    Ok(request)
}

/// Middleware guarding every `/admin/api/v1` route.
pub async fn require_admin_session(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, Error> {
    let request = admin_session(&state, request)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::header, middleware::from_fn_with_state, routing::get};
    use axum_test::TestServer;

    use super::*;
    use crate::api::models::users::CurrentUser;
    use crate::test_utils::{admin_cookie, create_test_state, lazy_pool};

    async fn whoami(user: CurrentUser) -> String {
        user.email
    }

    fn request(cookie: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/admin/api/v1/portfolio");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_session_inserts_user() {
        let ctx = create_test_state(lazy_pool());
        let cookie = admin_cookie(&ctx.state.config);

        let request = admin_session(&ctx.state, request(Some(&cookie))).unwrap();
        let user = request.extensions().get::<CurrentUser>().unwrap();
        assert_eq!(user.email, "admin@test.com");
    }

    #[tokio::test]
    async fn test_missing_or_bad_session_rejected() {
        let ctx = create_test_state(lazy_pool());

        let err = admin_session(&ctx.state, request(None)).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));

        let bad = format!("{}=forged", ctx.state.config.auth.session.cookie_name);
        let err = admin_session(&ctx.state, request(Some(&bad))).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_middleware_guards_routes() {
        let ctx = create_test_state(lazy_pool());
        let cookie = admin_cookie(&ctx.state.config);
        let router = Router::new()
            .route("/admin/api/v1/whoami", get(whoami))
            .layer(from_fn_with_state(ctx.state.clone(), require_admin_session))
            .with_state(ctx.state.clone());
        let server = TestServer::new(router).unwrap();

        let response = server.get("/admin/api/v1/whoami").await;
        response.assert_status_unauthorized();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);

        let response = server.get("/admin/api/v1/whoami").add_header(header::COOKIE, cookie).await;
        response.assert_status_ok();
        response.assert_text("admin@test.com");
    }
}
