//! URL classification for stored media.
//!
//! A stored URL is either *private* (it points at the object-store API endpoint and is only
//! readable with a signature) or *public* (CDN / public bucket domain). Only private URLs are
//! rewritten on read.

use url::Url;

use crate::config::StorageConfig;
use crate::storage::StorageError;

#[derive(Debug, Clone)]
pub struct ObjectUrls {
    bucket: String,
    /// Hosts of the private API endpoint, lowercased.
    private_hosts: Vec<String>,
    /// Public base without trailing slash.
    public_base: String,
}

impl ObjectUrls {
    pub fn new(bucket: impl Into<String>, private_hosts: Vec<String>, public_base: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            private_hosts: private_hosts.into_iter().map(|h| h.to_ascii_lowercase()).collect(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| StorageError::Config {
            message: format!("endpoint '{}': {e}", config.endpoint),
        })?;
        let host = endpoint.host_str().ok_or_else(|| StorageError::Config {
            message: format!("endpoint '{}' has no host", config.endpoint),
        })?;

        let mut hosts = vec![host.to_string()];
        hosts.extend(config.private_hosts.iter().cloned());

        Ok(Self::new(config.bucket.clone(), hosts, config.public_base()))
    }

    /// Public URL for an object key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }

    /// Whether `url` points at the private endpoint (directly or as a bucket subdomain).
    pub fn is_private(&self, url: &str) -> bool {
        self.private_host_of(url).is_some()
    }

    /// Returns the parsed URL and, when it is private, whether it is virtual-hosted.
    fn private_host_of(&self, url: &str) -> Option<(Url, bool)> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();

        for private in &self.private_hosts {
            if host == *private {
                return Some((parsed, false));
            }
            if host.strip_suffix(private.as_str()).is_some_and(|sub| sub.ends_with('.')) {
                return Some((parsed, true));
            }
        }
        None
    }

    /// Recover the object key from a stored URL, private or public.
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        if let Some((parsed, virtual_hosted)) = self.private_host_of(url) {
            let segments: Vec<String> = parsed.path_segments()?.map(percent_decode).collect();
            let segments = match segments.split_first() {
                Some((first, rest)) if !virtual_hosted && *first == self.bucket => rest,
                _ => &segments[..],
            };
            return non_empty(segments.join("/"));
        }

        let rest = url.strip_prefix(&self.public_base)?.strip_prefix('/')?;
        let path = rest.split(['?', '#']).next().unwrap_or_default();
        non_empty(path.split('/').map(percent_decode).collect::<Vec<_>>().join("/"))
    }

    /// Key for a media field: the explicit key when present, otherwise parsed from the URL.
    pub fn resolve_key(&self, url: Option<&str>, key: Option<&str>) -> Option<String> {
        match key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => Some(key.to_string()),
            None => url.and_then(|u| self.key_from_url(u)),
        }
    }
}

fn non_empty(key: String) -> Option<String> {
    if key.is_empty() || key.chars().all(|c| c == '/') { None } else { Some(key) }
}

/// Decode `%XX` escapes in a URL path segment. Invalid escapes are kept as-is.
fn percent_decode(segment: &str) -> String {
    percent_encoding::percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> ObjectUrls {
        ObjectUrls::new(
            "studio-media",
            vec!["acct.r2.cloudflarestorage.com".to_string()],
            "https://media.example.com/",
        )
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            urls().public_url("portfolio/1-clip.mp4"),
            "https://media.example.com/portfolio/1-clip.mp4"
        );
    }

    #[test]
    fn test_private_detection() {
        let urls = urls();
        assert!(urls.is_private("https://acct.r2.cloudflarestorage.com/studio-media/portfolio/1-clip.mp4"));
        assert!(urls.is_private("https://studio-media.acct.r2.cloudflarestorage.com/portfolio/1-clip.mp4"));
        assert!(urls.is_private("https://ACCT.R2.cloudflarestorage.com/x"));

        assert!(!urls.is_private("https://media.example.com/portfolio/1-clip.mp4"));
        assert!(!urls.is_private("https://evilacct.r2.cloudflarestorage.com/x"));
        assert!(!urls.is_private("not a url"));
        assert!(!urls.is_private(""));
    }

    #[test]
    fn test_key_from_path_style_url() {
        let key = urls().key_from_url("https://acct.r2.cloudflarestorage.com/studio-media/portfolio/1-clip.mp4");
        assert_eq!(key.as_deref(), Some("portfolio/1-clip.mp4"));
    }

    #[test]
    fn test_key_from_virtual_hosted_url() {
        let key = urls().key_from_url("https://studio-media.acct.r2.cloudflarestorage.com/team/5-jo.png?X-Amz-Expires=3600");
        assert_eq!(key.as_deref(), Some("team/5-jo.png"));
    }

    #[test]
    fn test_key_from_url_is_percent_decoded() {
        let key = urls().key_from_url("https://acct.r2.cloudflarestorage.com/studio-media/legacy/My%20Clip.mp4");
        assert_eq!(key.as_deref(), Some("legacy/My Clip.mp4"));
    }

    #[test]
    fn test_key_from_public_url() {
        let key = urls().key_from_url("https://media.example.com/thumbnails/9-poster.jpg");
        assert_eq!(key.as_deref(), Some("thumbnails/9-poster.jpg"));
    }

    #[test]
    fn test_key_from_unrelated_or_empty_url() {
        let urls = urls();
        assert_eq!(urls.key_from_url("https://youtube.com/watch?v=abc"), None);
        assert_eq!(urls.key_from_url("https://acct.r2.cloudflarestorage.com/"), None);
        assert_eq!(urls.key_from_url("https://acct.r2.cloudflarestorage.com/studio-media/"), None);
        assert_eq!(urls.key_from_url("https://media.example.com/"), None);
    }

    #[test]
    fn test_explicit_key_wins() {
        let urls = urls();
        let url = "https://acct.r2.cloudflarestorage.com/studio-media/portfolio/1-old.mp4";

        assert_eq!(urls.resolve_key(Some(url), Some("portfolio/2-new.mp4")).as_deref(), Some("portfolio/2-new.mp4"));
        assert_eq!(urls.resolve_key(Some(url), Some("  ")).as_deref(), Some("portfolio/1-old.mp4"));
        assert_eq!(urls.resolve_key(Some(url), None).as_deref(), Some("portfolio/1-old.mp4"));
        assert_eq!(urls.resolve_key(None, None), None);
    }

    #[test]
    fn test_from_config_defaults_to_path_style_public_base() {
        let config = StorageConfig {
            endpoint: "http://minio:9000".to_string(),
            bucket: "media".to_string(),
            ..Default::default()
        };
        let urls = ObjectUrls::from_config(&config).unwrap();

        let public = urls.public_url("reels/1-a.mp4");
        assert_eq!(public, "http://minio:9000/media/reels/1-a.mp4");
        // Without a CDN the public URL is itself private and gets signed on read
        assert!(urls.is_private(&public));
        assert_eq!(urls.key_from_url(&public).as_deref(), Some("reels/1-a.mp4"));
    }
}
