//! HTTP request handlers, one module per resource.
//!
//! Admin handlers are mounted under `/admin/api/v1` behind
//! [`require_admin_session`](crate::auth::middleware::require_admin_session); public handlers
//! live under `/api` and only ever show active records.
//!
//! Every handler that returns media passes its response through the
//! [`UrlSigner`](crate::storage::UrlSigner). Writes that replace or remove media schedule the
//! orphaned objects on the [`CleanupQueue`](crate::storage::CleanupQueue) after the database
//! change is committed.
//!
//! - [`auth`]: login, logout, current admin
//! - [`uploads`]: presigned PUTs and standalone thumbnail uploads
//! - [`portfolio`], [`showreels`], [`reels`], [`about_video`], [`team`]: media content
//! - [`jobs`], [`applications`]: careers
//! - [`contacts`]: contact form

pub mod about_video;
pub mod applications;
pub mod auth;
pub mod contacts;
pub mod jobs;
pub mod portfolio;
pub mod reels;
pub mod showreels;
pub mod team;
pub mod uploads;

use std::fmt::Display;

use crate::errors::Error;

pub(crate) fn not_found(resource: &str, id: impl Display) -> Error {
    Error::NotFound {
        resource: resource.to_string(),
        id: id.to_string(),
    }
}

pub(crate) fn db_error(e: sqlx::Error) -> Error {
    Error::Database(e.into())
}
