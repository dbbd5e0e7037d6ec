//! API request models for direct-to-storage uploads.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Ask for a presigned PUT. Fields are checked by the issuer so every problem is reported at once.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub content_type: String,
    /// One of `portfolio`, `showreel`, `thumbnails`, `resumes`, `about-video`, `team`, `reels`
    #[serde(default)]
    pub folder: String,
}
