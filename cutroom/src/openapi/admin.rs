//! OpenAPI documentation for the management API (`/admin/api/v1/*`).

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;

/// Session cookie set by `POST /authentication/login`.
pub struct CookieAuthAddon;

impl Modify for CookieAuthAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.security_schemes.insert(
            "CookieAuth".to_string(),
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "cutroom_session",
                "Session cookie issued by `POST /authentication/login`. Browsers send it automatically; \
                 it expires after the configured session timeout (7 days by default).",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::uploads::presign,
        api::handlers::uploads::upload_thumbnail,
        api::handlers::portfolio::list_portfolio,
        api::handlers::portfolio::get_portfolio_item,
        api::handlers::portfolio::create_portfolio_item,
        api::handlers::portfolio::update_portfolio_item,
        api::handlers::portfolio::delete_portfolio_item,
        api::handlers::showreels::list_showreels,
        api::handlers::showreels::get_showreel,
        api::handlers::showreels::create_showreel,
        api::handlers::showreels::update_showreel,
        api::handlers::showreels::delete_showreel,
        api::handlers::reels::list_reels,
        api::handlers::reels::get_reel,
        api::handlers::reels::create_reel,
        api::handlers::reels::update_reel,
        api::handlers::reels::delete_reel,
        api::handlers::about_video::get_about_video,
        api::handlers::about_video::put_about_video,
        api::handlers::about_video::delete_about_video,
        api::handlers::team::list_team,
        api::handlers::team::get_team_member,
        api::handlers::team::create_team_member,
        api::handlers::team::update_team_member,
        api::handlers::team::delete_team_member,
        api::handlers::jobs::list_jobs,
        api::handlers::jobs::get_job,
        api::handlers::jobs::create_job,
        api::handlers::jobs::update_job,
        api::handlers::jobs::delete_job,
        api::handlers::applications::list_applications,
        api::handlers::applications::get_application,
        api::handlers::applications::update_application,
        api::handlers::applications::delete_application,
        api::handlers::contacts::list_contacts,
        api::handlers::contacts::get_contact,
        api::handlers::contacts::update_contact,
        api::handlers::contacts::delete_contact,
    ),
    components(schemas(
        crate::storage::UploadFolder,
        crate::storage::StorageObjectReference,
        crate::db::models::applications::ApplicationStatus,
        crate::db::models::contacts::ContactStatus,
    )),
    modifiers(&CookieAuthAddon),
)]
pub struct AdminApiDoc;
