//! # cutroom: content backend for a video-editing studio
//!
//! `cutroom` serves the studio's public site and its admin panel: the portfolio, showreels,
//! short reels, the about-page video, the team, job postings with their applications, and the
//! contact form. Records live in PostgreSQL; the media they point at (videos, thumbnails, team
//! photos, resumes) lives in an S3-compatible bucket.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for persistence.
//!
//! ### Request Flow
//!
//! #### Public site (`/api/*`)
//!
//! Unauthenticated, read-mostly. Every listing is filtered to active records, and every record
//! goes through the [`UrlSigner`](storage::UrlSigner) on the way out so media stored behind a
//! private bucket endpoint is reachable for a short while. Visitors can also apply to open jobs
//! (optionally attaching a resume) and send the contact form.
//!
//! #### Management API (`/admin/api/v1/*`)
//!
//! Every request passes through [`require_admin_session`](auth::middleware::require_admin_session),
//! which validates the session cookie issued by `POST /authentication/login`. Large media never
//! passes through the server: the admin UI asks for a presigned PUT
//! (`POST /admin/api/v1/uploads/presign`), uploads straight to the bucket, then saves the record
//! with the returned URL and key. Record endpoints still accept `multipart/form-data` for clients
//! that upload through the server.
//!
//! When a write replaces or removes media, the orphaned object keys are handed to the
//! [`CleanupQueue`](storage::CleanupQueue) after the database change commits. A background
//! worker deletes them; failures are logged and never surface to the client.
//!
//! ### Core Components
//!
//! - [`api`]: handlers, extractors and wire models
//! - [`auth`]: session tokens, password hashing and the admin middleware
//! - [`db`]: one repository per table behind the [`Repository`](db::handlers::Repository) trait
//! - [`storage`]: presigned uploads, URL signing and object cleanup
//! - [`config`]: YAML + environment configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use cutroom::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = cutroom::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     cutroom::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations are embedded and run on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! cutroom::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod storage;
pub mod telemetry;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
pub use types::UserId;

use crate::{
    api::handlers,
    auth::{middleware::require_admin_session, password},
    config::{CorsOrigin, PoolSettings},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::Error,
    openapi::ApiDoc,
    storage::{CleanupQueue, ObjectStore, ObjectUrls, UploadIssuer, UrlSigner, s3::S3Store},
};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file and environment
/// - `storage`: The object store backend (S3 in production, an in-memory recorder in tests)
/// - `urls`: Maps between object keys, public URLs and private-endpoint URLs
/// - `issuer`: Presigns browser uploads and performs server-side uploads
/// - `signer`: Rewrites private media URLs in responses into presigned GETs
/// - `cleanup`: Schedules deletion of orphaned objects
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub storage: Arc<dyn ObjectStore>,
    pub urls: Arc<ObjectUrls>,
    pub issuer: UploadIssuer,
    pub signer: UrlSigner,
    pub cleanup: CleanupQueue,
}

impl AppState {
    /// Assemble state around a store, deriving the issuer and signer from the storage settings.
    pub fn from_parts(db: PgPool, config: Config, storage: Arc<dyn ObjectStore>, urls: Arc<ObjectUrls>, cleanup: CleanupQueue) -> Self {
        let expires_in = config.storage.presign_expiry;
        Self::builder()
            .issuer(UploadIssuer::new(storage.clone(), urls.clone(), expires_in))
            .signer(UrlSigner::new(storage.clone(), urls.clone(), expires_in))
            .db(db)
            .config(config)
            .storage(storage)
            .urls(urls)
            .cleanup(cleanup)
            .build()
    }
}

/// Get the cutroom database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: an existing account keeps its id and only has its password reset when one is
/// given. Called at startup so there is always a way into the admin panel.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(
    email: &str,
    password: Option<&str>,
    params: password::Argon2Params,
    db: &PgPool,
) -> Result<UserId, Error> {
    let password_hash = password
        .map(|pwd| password::hash_string_with_params(pwd, Some(params)))
        .transpose()?;

    let mut tx = db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut tx);

    let id = match users.get_user_by_email(email).await? {
        Some(existing) => {
            if password_hash.is_some() {
                users
                    .update(
                        existing.id,
                        &UserUpdateDBRequest {
                            password_hash,
                            ..Default::default()
                        },
                    )
                    .await?;
                info!("Reset password for admin {email}");
            }
            existing.id
        }
        None => {
            let created = users
                .create(&UserCreateDBRequest {
                    email: email.to_string(),
                    display_name: None,
                    password_hash,
                })
                .await?;
            info!("Created admin {email}");
            created.id
        }
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    Ok(id)
}

fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    let seconds = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(seconds(settings.idle_timeout_secs))
        .max_lifetime(seconds(settings.max_lifetime_secs))
}

/// Connect, run migrations, and make sure the initial admin exists.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool = pool_options(&config.database.pool).connect(&config.database.url).await?;
    migrator().run(&pool).await?;

    create_initial_admin_user(
        &config.admin_email,
        config.admin_password.as_deref(),
        password::Argon2Params::from_config(&config.auth.password),
        &pool,
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            // Browsers send origins without a trailing slash
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router.
///
/// - `/authentication/*`: login, logout, current admin
/// - `/api/*`: the public site
/// - `/admin/api/v1/*`: the management API, behind the session middleware
/// - `/healthz`, `/api-docs/openapi.json` and the API reference at `/admin/docs`
///
/// Request bodies (JSON and multipart alike) are capped at `uploads.max_body_size`.
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/authentication/login", post(handlers::auth::login))
        .route("/authentication/logout", post(handlers::auth::logout))
        .route("/authentication/me", get(handlers::auth::me));

    let public_routes = Router::new()
        .route("/portfolio", get(handlers::portfolio::list_public_portfolio))
        .route("/portfolio/{id}", get(handlers::portfolio::get_public_portfolio_item))
        .route("/showreel", get(handlers::showreels::get_public_showreel))
        .route("/reels", get(handlers::reels::list_public_reels))
        .route("/about-video", get(handlers::about_video::get_public_about_video))
        .route("/team", get(handlers::team::list_public_team))
        .route("/jobs", get(handlers::jobs::list_public_jobs))
        .route("/jobs/{id}", get(handlers::jobs::get_public_job))
        .route("/jobs/{id}/applications", post(handlers::applications::submit_application))
        .route("/contact", post(handlers::contacts::submit_contact));

    let admin_routes = Router::new()
        // Uploads
        .route("/uploads/presign", post(handlers::uploads::presign))
        .route("/thumbnails", post(handlers::uploads::upload_thumbnail))
        // Portfolio
        .route(
            "/portfolio",
            get(handlers::portfolio::list_portfolio).post(handlers::portfolio::create_portfolio_item),
        )
        .route(
            "/portfolio/{id}",
            get(handlers::portfolio::get_portfolio_item)
                .patch(handlers::portfolio::update_portfolio_item)
                .delete(handlers::portfolio::delete_portfolio_item),
        )
        // Showreels
        .route(
            "/showreels",
            get(handlers::showreels::list_showreels).post(handlers::showreels::create_showreel),
        )
        .route(
            "/showreels/{id}",
            get(handlers::showreels::get_showreel)
                .patch(handlers::showreels::update_showreel)
                .delete(handlers::showreels::delete_showreel),
        )
        // Reels
        .route("/reels", get(handlers::reels::list_reels).post(handlers::reels::create_reel))
        .route(
            "/reels/{id}",
            get(handlers::reels::get_reel)
                .patch(handlers::reels::update_reel)
                .delete(handlers::reels::delete_reel),
        )
        // About video
        .route(
            "/about-video",
            get(handlers::about_video::get_about_video)
                .put(handlers::about_video::put_about_video)
                .delete(handlers::about_video::delete_about_video),
        )
        // Team
        .route("/team", get(handlers::team::list_team).post(handlers::team::create_team_member))
        .route(
            "/team/{id}",
            get(handlers::team::get_team_member)
                .patch(handlers::team::update_team_member)
                .delete(handlers::team::delete_team_member),
        )
        // Careers
        .route("/jobs", get(handlers::jobs::list_jobs).post(handlers::jobs::create_job))
        .route(
            "/jobs/{id}",
            get(handlers::jobs::get_job)
                .patch(handlers::jobs::update_job)
                .delete(handlers::jobs::delete_job),
        )
        .route("/applications", get(handlers::applications::list_applications))
        .route(
            "/applications/{id}",
            get(handlers::applications::get_application)
                .patch(handlers::applications::update_application)
                .delete(handlers::applications::delete_application),
        )
        // Contact form
        .route("/contacts", get(handlers::contacts::list_contacts))
        .route(
            "/contacts/{id}",
            get(handlers::contacts::get_contact)
                .patch(handlers::contacts::update_contact)
                .delete(handlers::contacts::delete_contact),
        )
        .layer(from_fn_with_state(state.clone(), require_admin_session));

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(auth_routes)
        .nest("/api", public_routes)
        .nest("/admin/api/v1", admin_routes)
        .layer(DefaultBodyLimit::max(state.config.uploads.max_body_size))
        .with_state(state.clone())
        .merge(Scalar::with_url("/admin/docs", ApiDoc::openapi()))
        .route("/api-docs/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }));

    let router = router.layer(create_cors_layer(&state.config)?);

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// A running instance: the router plus the resources that must be released on shutdown.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
    cleanup_worker: JoinHandle<()>,
    shutdown_token: CancellationToken,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting cutroom with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        let urls = Arc::new(ObjectUrls::from_config(&config.storage)?);
        let store: Arc<dyn ObjectStore> = Arc::new(S3Store::from_config(&config.storage).await);

        let shutdown_token = CancellationToken::new();
        let (cleanup, worker) = CleanupQueue::new(store.clone());
        let cleanup_worker = worker.spawn(shutdown_token.clone());

        let state = AppState::from_parts(pool.clone(), config.clone(), store, urls, cleanup);
        let router = build_router(&state)?;

        Ok(Self {
            router,
            config,
            pool,
            cleanup_worker,
            shutdown_token,
        })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "cutroom listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Finish pending object deletions
        info!("Draining storage cleanup queue...");
        self.shutdown_token.cancel();
        if let Err(e) = self.cleanup_worker.await {
            tracing::error!("Storage cleanup worker panicked: {}", e);
        }

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    use super::*;
    use crate::test_utils::{
        admin_cookie, create_test_admin, create_test_config, create_test_server, create_test_state, create_test_state_with_config,
        lazy_pool,
    };

    #[tokio::test]
    async fn test_healthz() {
        let ctx = create_test_state(lazy_pool());
        let server = create_test_server(&ctx.state);

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[tokio::test]
    async fn test_docs_are_served() {
        let ctx = create_test_state(lazy_pool());
        let server = create_test_server(&ctx.state);

        let doc: Value = server.get("/api-docs/openapi.json").await.json();
        assert!(doc["paths"]["/admin/api/v1/portfolio"].is_object());
        assert!(doc["paths"]["/api/showreel"].is_object());

        server.get("/admin/docs").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_admin_routes_require_session() {
        let ctx = create_test_state(lazy_pool());
        let server = create_test_server(&ctx.state);

        for path in ["/admin/api/v1/portfolio", "/admin/api/v1/jobs", "/admin/api/v1/contacts"] {
            let response = server.get(path).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            assert_eq!(response.json::<Value>()["success"], false);
        }

        server
            .post("/admin/api/v1/uploads/presign")
            .add_header("cookie", "cutroom_session=forged")
            .json(&json!({ "fileName": "a.mp4", "contentType": "video/mp4", "folder": "portfolio" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_body_limit_uses_envelope() {
        let mut config = create_test_config();
        config.uploads.max_body_size = 256;
        let ctx = create_test_state_with_config(lazy_pool(), config);
        let server = create_test_server(&ctx.state);

        let response = server
            .post("/api/contact")
            .json(&json!({ "name": "Jordan", "email": "jordan@brand.test", "message": "x".repeat(1024) }))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.json::<Value>()["success"], false);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let mut config = create_test_config();
        config.auth.cors.allowed_origins = vec![CorsOrigin::Url("https://studio.example.com".parse().unwrap())];
        config.auth.cors.allow_credentials = true;
        let ctx = create_test_state_with_config(lazy_pool(), config);
        let server = create_test_server(&ctx.state);

        let response = server
            .method(http::Method::OPTIONS, "/admin/api/v1/portfolio")
            .add_header("origin", "https://studio.example.com")
            .add_header("access-control-request-method", "PATCH")
            .await;

        assert_eq!(
            response.header("access-control-allow-origin"),
            HeaderValue::from_static("https://studio.example.com")
        );
        assert_eq!(response.header("access-control-allow-credentials"), HeaderValue::from_static("true"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_initial_admin_user_is_idempotent(pool: PgPool) {
        let params = password::Argon2Params::cheap_for_tests();
        let first = create_initial_admin_user("owner@studio.test", Some("first-password"), params, &pool)
            .await
            .unwrap();
        let second = create_initial_admin_user("owner@studio.test", Some("second-password"), params, &pool)
            .await
            .unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn).get_user_by_email("owner@studio.test").await.unwrap().unwrap();
        let hash = user.password_hash.unwrap();
        assert!(password::verify_string("second-password", &hash).unwrap());
        assert!(!password::verify_string("first-password", &hash).unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_then_admin_request(pool: PgPool) {
        create_test_admin(&pool, "editor@studio.test", "correct horse battery").await;
        let ctx = create_test_state(pool);
        let server = create_test_server(&ctx.state);

        let response = server
            .post("/authentication/login")
            .json(&json!({ "email": "editor@studio.test", "password": "correct horse battery" }))
            .await;
        response.assert_status_ok();
        let cookie = response.cookie("cutroom_session");

        server
            .get("/admin/api/v1/portfolio")
            .add_header("cookie", format!("cutroom_session={}", cookie.value()))
            .await
            .assert_status_ok();

        // A token signed for this config works regardless of the database
        server
            .get("/admin/api/v1/jobs")
            .add_header("cookie", admin_cookie(&ctx.state.config))
            .await
            .assert_status_ok();
    }
}
