//! Admin authentication.
//!
//! Admins sign in with email and password at `/authentication/login`. A successful login sets
//! an `HttpOnly` cookie holding an HS256 JWT ([`session`]) that expires with the session
//! timeout (seven days by default). There is no server-side session store: the token is the
//! session, and logging out clears the cookie.
//!
//! Every `/admin/api/v1` route sits behind [`middleware::require_admin_session`], which
//! verifies the cookie and places the [`CurrentUser`] in the request extensions. Handlers
//! that need the caller take `CurrentUser` as an extractor ([`current_user`]).
//!
//! Passwords are hashed with Argon2id ([`password`]).
//!
//! [`CurrentUser`]: crate::api::models::users::CurrentUser

pub mod current_user;
pub mod middleware;
pub mod password;
pub mod session;
