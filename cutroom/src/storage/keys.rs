//! Object key layout and per-folder upload rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Cache-Control for video objects: one year, never revalidated.
pub const VIDEO_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Cache-Control for everything else: one month.
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=2592000";

const DOCUMENT_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Top-level key namespace an upload lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum UploadFolder {
    Portfolio,
    Showreel,
    Thumbnails,
    Resumes,
    AboutVideo,
    Team,
    Reels,
}

/// What kind of file a folder holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FolderContent {
    Video,
    Image,
    Document,
}

impl UploadFolder {
    pub const ALL: [UploadFolder; 7] = [
        UploadFolder::Portfolio,
        UploadFolder::Showreel,
        UploadFolder::Thumbnails,
        UploadFolder::Resumes,
        UploadFolder::AboutVideo,
        UploadFolder::Team,
        UploadFolder::Reels,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portfolio => "portfolio",
            Self::Showreel => "showreel",
            Self::Thumbnails => "thumbnails",
            Self::Resumes => "resumes",
            Self::AboutVideo => "about-video",
            Self::Team => "team",
            Self::Reels => "reels",
        }
    }

    fn content(&self) -> FolderContent {
        match self {
            Self::Portfolio | Self::Showreel | Self::AboutVideo | Self::Reels => FolderContent::Video,
            Self::Thumbnails | Self::Team => FolderContent::Image,
            Self::Resumes => FolderContent::Document,
        }
    }

    /// Whether files of `content_type` may be stored in this folder.
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = essence(content_type);
        match self.content() {
            FolderContent::Video => has_subtype(&essence, "video/"),
            FolderContent::Image => has_subtype(&essence, "image/"),
            FolderContent::Document => DOCUMENT_CONTENT_TYPES.contains(&essence.as_str()),
        }
    }

    /// Human-readable description of what [`accepts`](Self::accepts) lets through.
    pub fn accepted_description(&self) -> &'static str {
        match self.content() {
            FolderContent::Video => "video/*",
            FolderContent::Image => "image/*",
            FolderContent::Document => "PDF or Word documents",
        }
    }
}

impl fmt::Display for UploadFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for folder names outside the known set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFolder(pub String);

impl fmt::Display for UnknownFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = UploadFolder::ALL.iter().map(UploadFolder::as_str).collect();
        write!(f, "Unknown upload folder '{}', expected one of: {}", self.0, known.join(", "))
    }
}

impl std::error::Error for UnknownFolder {}

impl FromStr for UploadFolder {
    type Err = UnknownFolder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UploadFolder::ALL
            .into_iter()
            .find(|folder| folder.as_str() == s)
            .ok_or_else(|| UnknownFolder(s.to_string()))
    }
}

/// Lowercased media type without parameters (`Video/MP4; codecs=avc1` -> `video/mp4`).
fn essence(content_type: &str) -> String {
    content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

fn has_subtype(essence: &str, prefix: &str) -> bool {
    essence.len() > prefix.len() && essence.starts_with(prefix)
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}

/// `<folder>/<epochMillis>-<sanitized file name>`
pub fn object_key(folder: UploadFolder, file_name: &str, epoch_millis: i64) -> String {
    format!("{}/{}-{}", folder.as_str(), epoch_millis, sanitize_file_name(file_name))
}

/// Cache-Control header stored with an object of `content_type`.
pub fn cache_control_for(content_type: &str) -> &'static str {
    if essence(content_type).starts_with("video/") {
        VIDEO_CACHE_CONTROL
    } else {
        DEFAULT_CACHE_CONTROL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("My Clip.mp4"), "My_Clip.mp4");
        assert_eq!(sanitize_file_name("final-cut_v2.MOV"), "final-cut_v2.MOV");
        assert_eq!(sanitize_file_name("résumé (1).pdf"), "r_sum___1_.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
    }

    #[test]
    fn test_object_key_layout() {
        let key = object_key(UploadFolder::Portfolio, "My Clip.mp4", 1_700_000_000_000);
        assert_eq!(key, "portfolio/1700000000000-My_Clip.mp4");

        let key = object_key(UploadFolder::AboutVideo, "intro.webm", 42);
        assert_eq!(key, "about-video/42-intro.webm");
    }

    #[test]
    fn test_folder_round_trip_and_unknown() {
        for folder in UploadFolder::ALL {
            assert_eq!(folder.as_str().parse::<UploadFolder>().unwrap(), folder);
        }

        let err = "videos".parse::<UploadFolder>().unwrap_err();
        assert_eq!(err, UnknownFolder("videos".to_string()));
        assert!(err.to_string().contains("about-video"));

        // Folder names are exact
        assert!("Portfolio".parse::<UploadFolder>().is_err());
    }

    #[test]
    fn test_folder_serde_names_match_as_str() {
        for folder in UploadFolder::ALL {
            let json = serde_json::to_value(folder).unwrap();
            assert_eq!(json, folder.as_str());
        }
    }

    #[test]
    fn test_cache_policy() {
        assert_eq!(cache_control_for("video/mp4"), VIDEO_CACHE_CONTROL);
        assert_eq!(cache_control_for("Video/QuickTime"), VIDEO_CACHE_CONTROL);
        assert_eq!(cache_control_for("image/jpeg"), DEFAULT_CACHE_CONTROL);
        assert_eq!(cache_control_for("application/pdf"), DEFAULT_CACHE_CONTROL);
    }

    #[test]
    fn test_folder_content_rules() {
        assert!(UploadFolder::Portfolio.accepts("video/mp4"));
        assert!(UploadFolder::Reels.accepts("video/webm; codecs=vp9"));
        assert!(!UploadFolder::Showreel.accepts("image/png"));
        assert!(!UploadFolder::AboutVideo.accepts("video/"));

        assert!(UploadFolder::Thumbnails.accepts("image/webp"));
        assert!(UploadFolder::Team.accepts("IMAGE/JPEG"));
        assert!(!UploadFolder::Team.accepts("video/mp4"));

        assert!(UploadFolder::Resumes.accepts("application/pdf"));
        assert!(UploadFolder::Resumes.accepts(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        ));
        assert!(!UploadFolder::Resumes.accepts("application/zip"));
        assert!(!UploadFolder::Resumes.accepts("text/html"));
    }
}
