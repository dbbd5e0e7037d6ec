//! OpenAPI documentation.
//!
//! The document served at `/api-docs/openapi.json` (and rendered at `/admin/docs`) stitches the
//! route surfaces together under their mount points:
//! - session endpoints at `/authentication/*`, listed on [`ApiDoc`] itself
//! - [`PublicApiDoc`]: the public site API at `/api/*`
//! - [`admin::AdminApiDoc`]: the management API at `/admin/api/v1/*`

pub mod admin;

use utoipa::OpenApi;

use crate::api;
pub use admin::AdminApiDoc;
use admin::CookieAuthAddon;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::portfolio::list_public_portfolio,
        api::handlers::portfolio::get_public_portfolio_item,
        api::handlers::showreels::get_public_showreel,
        api::handlers::reels::list_public_reels,
        api::handlers::about_video::get_public_about_video,
        api::handlers::team::list_public_team,
        api::handlers::jobs::list_public_jobs,
        api::handlers::jobs::get_public_job,
        api::handlers::applications::submit_application,
        api::handlers::contacts::submit_contact,
    ),
    components(schemas(crate::errors::FieldError)),
)]
pub struct PublicApiDoc;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cutroom API",
        description = "Content backend for the studio site: portfolio, showreels, reels, team, careers and contact.

Public endpoints live under `/api` and only ever return active records. Management endpoints live under `/admin/api/v1` and need the session cookie set by `POST /authentication/login`.

Every response is wrapped in `{ \"success\": true, \"data\": ... }` or `{ \"success\": false, \"error\": \"...\" }`.",
    ),
    paths(api::handlers::auth::login, api::handlers::auth::logout, api::handlers::auth::me),
    components(schemas(api::models::users::LoginRequest, api::models::users::UserResponse)),
    modifiers(&CookieAuthAddon),
    nest(
        (path = "/api", api = PublicApiDoc),
        (path = "/admin/api/v1", api = AdminApiDoc),
    ),
    tags(
        (name = "authentication", description = "Admin login and session"),
        (name = "public", description = "Public site content and submissions"),
        (name = "uploads", description = "Presigned uploads and thumbnails"),
        (name = "portfolio", description = "Portfolio items"),
        (name = "showreels", description = "Showreels"),
        (name = "reels", description = "Short reels"),
        (name = "about-video", description = "The about-page video"),
        (name = "team", description = "Team members"),
        (name = "jobs", description = "Job postings"),
        (name = "applications", description = "Job applications"),
        (name = "contacts", description = "Contact form submissions"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surfaces_are_mounted() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/authentication/login"));
        assert!(paths.contains_key("/api/portfolio"));
        assert!(paths.contains_key("/api/jobs/{id}/applications"));
        assert!(paths.contains_key("/admin/api/v1/portfolio"));
        assert!(paths.contains_key("/admin/api/v1/uploads/presign"));
        assert!(paths.contains_key("/admin/api/v1/about-video"));
    }

    #[test]
    fn test_cookie_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("CookieAuth"));
    }

    #[test]
    fn test_id_filters_are_documented_as_uuid_strings() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let params = doc["paths"]["/admin/api/v1/applications"]["get"]["parameters"].as_array().unwrap();
        let job_id = params.iter().find(|p| p["name"] == "jobId").expect("jobId parameter");

        assert_eq!(job_id["in"], "query");
        assert_eq!(job_id["schema"]["format"], "uuid");
    }
}
