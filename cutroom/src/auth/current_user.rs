//! Extracting the signed-in admin from a request.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    config::Config,
    errors::{Error, Result},
};

/// Extract the user from the session cookie if present.
///
/// - `None`: no session cookie
/// - `Some(Ok(user))`: a cookie carried a valid token
/// - `Some(Err(error))`: the cookie header was unreadable or every session cookie was invalid
#[instrument(skip(parts, config))]
pub(crate) fn try_session_cookie_auth(parts: &Parts, config: &Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.session.cookie_name;

    let mut last_error = None;
    for cookie in cookie_str.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=')
            && name == cookie_name
        {
            match session::verify_session_token(value, config) {
                Ok(user) => return Some(Ok(user)),
                // Stale cookies are expected; keep looking in case a fresh one follows
                Err(e) => last_error = Some(e),
            }
        }
    }
    last_error.map(Err)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Set by the admin middleware when it has already verified the cookie
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        match try_session_cookie_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found session authenticated user: {}", user.id);
                Ok(user)
            }
            Some(Err(e)) => {
                trace!("Session authentication failed: {:?}", e);
                Err(Error::Unauthenticated { message: None })
            }
            None => Err(Error::Unauthenticated { message: None }),
        }
    }
}
