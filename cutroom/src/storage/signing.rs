//! Read-URL signing.
//!
//! Records store the URL an object was uploaded under. When that URL points at the private
//! API endpoint it cannot be fetched by a browser, so responses swap it for a presigned GET.
//! Public (CDN) URLs pass through untouched. Signing never fails a request: if a key cannot be
//! determined or the store refuses to sign, the stored URL is returned as-is.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{trace, warn};

use crate::storage::{ObjectStore, ObjectUrls};

/// The media field pairs a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaField {
    Video,
    Thumbnail,
    Image,
    Resume,
}

impl MediaField {
    pub const ALL: [MediaField; 4] = [MediaField::Video, MediaField::Thumbnail, MediaField::Image, MediaField::Resume];

    /// Wire name of the URL half of the pair.
    pub fn url_field(&self) -> &'static str {
        match self {
            Self::Video => "videoUrl",
            Self::Thumbnail => "thumbnailUrl",
            Self::Image => "imageUrl",
            Self::Resume => "resumeUrl",
        }
    }

    /// Wire name of the key half of the pair.
    pub fn key_field(&self) -> &'static str {
        match self {
            Self::Video => "videoKey",
            Self::Thumbnail => "thumbnailKey",
            Self::Image => "imageKey",
            Self::Resume => "resumeKey",
        }
    }

    /// Multipart file part carrying this field in legacy uploads.
    pub fn form_part(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Thumbnail => "thumbnail",
            Self::Image => "image",
            Self::Resume => "resume",
        }
    }
}

/// Mutable view of one media field pair on a record.
pub struct MediaSlot<'a> {
    pub field: MediaField,
    pub url: &'a mut Option<String>,
    pub key: Option<&'a str>,
}

impl<'a> MediaSlot<'a> {
    pub fn new(field: MediaField, url: &'a mut Option<String>, key: &'a Option<String>) -> Self {
        Self {
            field,
            url,
            key: key.as_deref(),
        }
    }
}

/// A response type whose media URLs can be signed.
pub trait Signable: Send {
    /// One slot per media field pair the type carries.
    fn media_slots(&mut self) -> Vec<MediaSlot<'_>>;
}

#[derive(Clone)]
pub struct UrlSigner {
    store: Arc<dyn ObjectStore>,
    urls: Arc<ObjectUrls>,
    expires_in: Duration,
}

impl UrlSigner {
    pub fn new(store: Arc<dyn ObjectStore>, urls: Arc<ObjectUrls>, expires_in: Duration) -> Self {
        Self { store, urls, expires_in }
    }

    /// Sign every private media URL on `doc`. Fields are signed concurrently.
    pub async fn sign_document<T: Signable>(&self, mut doc: T) -> T {
        join_all(doc.media_slots().into_iter().map(|slot| self.sign_slot(slot))).await;
        doc
    }

    /// Sign a list of documents concurrently, preserving order.
    pub async fn sign_all<T: Signable>(&self, docs: Vec<T>) -> Vec<T> {
        join_all(docs.into_iter().map(|doc| self.sign_document(doc))).await
    }

    async fn sign_slot(&self, slot: MediaSlot<'_>) {
        let Some(url) = slot.url.as_deref() else {
            return;
        };
        if !self.urls.is_private(url) {
            return;
        }

        let Some(key) = self.urls.resolve_key(Some(url), slot.key) else {
            trace!(field = slot.field.url_field(), "No object key for private URL, leaving as stored");
            return;
        };

        match self.store.presign_get(&key, self.expires_in).await {
            Ok(signed) => *slot.url = Some(signed),
            Err(e) => warn!(field = slot.field.url_field(), key = %key, error = %e, "Failed to sign media URL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingStore, StoreCall, test_object_urls};

    const PRIVATE: &str = "https://acct.r2.cloudflarestorage.com/studio-media";

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Doc {
        title: String,
        video_url: Option<String>,
        video_key: Option<String>,
        thumbnail_url: Option<String>,
        thumbnail_key: Option<String>,
    }

    impl Signable for Doc {
        fn media_slots(&mut self) -> Vec<MediaSlot<'_>> {
            vec![
                MediaSlot::new(MediaField::Video, &mut self.video_url, &self.video_key),
                MediaSlot::new(MediaField::Thumbnail, &mut self.thumbnail_url, &self.thumbnail_key),
            ]
        }
    }

    fn signer(store: Arc<RecordingStore>) -> UrlSigner {
        UrlSigner::new(store, Arc::new(test_object_urls()), Duration::from_secs(3600))
    }

    fn gets(store: &RecordingStore) -> Vec<String> {
        store
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::PresignGet { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_public_urls_pass_through() {
        let store = Arc::new(RecordingStore::new());
        let doc = Doc {
            title: "Brand film".to_string(),
            video_url: Some("https://media.example.com/portfolio/1-a.mp4".to_string()),
            video_key: Some("portfolio/1-a.mp4".to_string()),
            ..Default::default()
        };

        let signed = signer(store.clone()).sign_document(doc.clone()).await;

        assert_eq!(signed, doc);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_private_url_signed_with_explicit_key() {
        let store = Arc::new(RecordingStore::new());
        let doc = Doc {
            video_url: Some(format!("{PRIVATE}/portfolio/1-old-name.mp4")),
            video_key: Some("portfolio/1-a.mp4".to_string()),
            ..Default::default()
        };

        let signed = signer(store.clone()).sign_document(doc).await;

        assert_eq!(signed.video_url.as_deref(), Some(RecordingStore::signed_get_url("portfolio/1-a.mp4").as_str()));
        assert_eq!(signed.video_key.as_deref(), Some("portfolio/1-a.mp4"));
        assert_eq!(
            store.calls(),
            vec![StoreCall::PresignGet {
                key: "portfolio/1-a.mp4".to_string(),
                expires_in: Duration::from_secs(3600),
            }]
        );
    }

    #[tokio::test]
    async fn test_private_url_without_key_falls_back_to_path() {
        let store = Arc::new(RecordingStore::new());
        let doc = Doc {
            thumbnail_url: Some(format!("{PRIVATE}/thumbnails/7-poster.jpg")),
            ..Default::default()
        };

        let signed = signer(store.clone()).sign_document(doc).await;

        assert_eq!(gets(&store), vec!["thumbnails/7-poster.jpg".to_string()]);
        assert_eq!(
            signed.thumbnail_url.as_deref(),
            Some(RecordingStore::signed_get_url("thumbnails/7-poster.jpg").as_str())
        );
    }

    #[tokio::test]
    async fn test_private_url_without_determinable_key_left_unchanged() {
        let store = Arc::new(RecordingStore::new());
        let doc = Doc {
            video_url: Some(format!("{PRIVATE}/")),
            ..Default::default()
        };

        let signed = signer(store.clone()).sign_document(doc.clone()).await;

        assert_eq!(signed, doc);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_signing_failure_keeps_stored_url() {
        let store = Arc::new(RecordingStore::new());
        store.fail_presign(true);
        let doc = Doc {
            video_url: Some(format!("{PRIVATE}/reels/3-r.mp4")),
            ..Default::default()
        };

        let signed = signer(store.clone()).sign_document(doc.clone()).await;

        assert_eq!(signed, doc);
        assert_eq!(gets(&store).len(), 1);
    }

    #[tokio::test]
    async fn test_one_call_per_eligible_field() {
        let store = Arc::new(RecordingStore::new());
        let doc = Doc {
            video_url: Some(format!("{PRIVATE}/showreel/1-s.mp4")),
            thumbnail_url: Some("https://media.example.com/thumbnails/1-s.jpg".to_string()),
            ..Default::default()
        };

        signer(store.clone()).sign_document(doc).await;

        assert_eq!(gets(&store), vec!["showreel/1-s.mp4".to_string()]);
    }

    #[tokio::test]
    async fn test_sign_all_preserves_order() {
        let store = Arc::new(RecordingStore::new());
        let docs: Vec<Doc> = (0..5)
            .map(|i| Doc {
                title: format!("doc {i}"),
                video_url: Some(format!("{PRIVATE}/reels/{i}-r.mp4")),
                ..Default::default()
            })
            .collect();

        let signed = signer(store.clone()).sign_all(docs).await;

        assert_eq!(signed.len(), 5);
        for (i, doc) in signed.iter().enumerate() {
            assert_eq!(doc.title, format!("doc {i}"));
            assert_eq!(
                doc.video_url.as_deref(),
                Some(RecordingStore::signed_get_url(&format!("reels/{i}-r.mp4")).as_str())
            );
        }
        assert_eq!(gets(&store).len(), 5);
    }

    #[tokio::test]
    async fn test_empty_list() {
        let store = Arc::new(RecordingStore::new());
        let signed: Vec<Doc> = signer(store.clone()).sign_all(Vec::new()).await;
        assert!(signed.is_empty());
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_wire_names() {
        let names: Vec<(&str, &str)> = MediaField::ALL.iter().map(|f| (f.url_field(), f.key_field())).collect();
        assert_eq!(
            names,
            vec![
                ("videoUrl", "videoKey"),
                ("thumbnailUrl", "thumbnailKey"),
                ("imageUrl", "imageKey"),
                ("resumeUrl", "resumeKey"),
            ]
        );
    }
}
