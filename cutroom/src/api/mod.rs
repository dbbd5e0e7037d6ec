//! HTTP layer: request extractors, handlers and wire models.
//!
//! - **[`extract`]**: body extractors that validate input and take multipart uploads
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: request/response structures
//!
//! # Routes
//!
//! - **Authentication** (`/authentication/*`): login, logout, current admin
//! - **Public site** (`/api/*`): read-only content (active records only), job applications,
//!   contact form
//! - **Admin** (`/admin/api/v1/*`): content management and uploads, behind the session
//!   middleware
//!
//! All endpoints are documented with `utoipa`; the rendered reference is served at `/admin/docs`.

pub mod extract;
pub mod handlers;
pub mod models;
