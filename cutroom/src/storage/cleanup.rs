//! Best-effort deletion of storage objects that are no longer referenced.
//!
//! Handlers never wait on deletions. They enqueue keys after the database change has been
//! made and return; a single background worker drains the queue and logs failures. A failed
//! deletion leaves an orphaned object in the bucket, never a failed request.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::storage::{MediaField, ObjectStore, ObjectUrls};

/// Read-only view of one stored media field pair.
#[derive(Debug, Clone, Copy)]
pub struct StoredRef<'a> {
    pub field: MediaField,
    pub url: Option<&'a str>,
    pub key: Option<&'a str>,
}

impl<'a> StoredRef<'a> {
    pub fn new(field: MediaField, url: &'a Option<String>, key: &'a Option<String>) -> Self {
        Self {
            field,
            url: url.as_deref(),
            key: key.as_deref(),
        }
    }
}

/// A persisted record that owns storage objects.
pub trait StoredMedia {
    fn stored_media(&self) -> Vec<StoredRef<'_>>;
}

/// Keys held by `before` that `after` no longer references, one per replaced or cleared field.
pub fn replaced_keys(urls: &ObjectUrls, before: &impl StoredMedia, after: &impl StoredMedia) -> Vec<String> {
    let after = after.stored_media();
    before
        .stored_media()
        .into_iter()
        .filter_map(|old| {
            let old_key = urls.resolve_key(old.url, old.key)?;
            let new_key = after
                .iter()
                .find(|new| new.field == old.field)
                .and_then(|new| urls.resolve_key(new.url, new.key));
            (new_key.as_deref() != Some(old_key.as_str())).then_some(old_key)
        })
        .collect()
}

/// Every key a record references.
pub fn owned_keys(urls: &ObjectUrls, record: &impl StoredMedia) -> Vec<String> {
    record
        .stored_media()
        .into_iter()
        .filter_map(|media| urls.resolve_key(media.url, media.key))
        .collect()
}

/// Handle for scheduling deletions. Cheap to clone.
#[derive(Clone)]
pub struct CleanupQueue {
    tx: mpsc::UnboundedSender<String>,
}

impl CleanupQueue {
    /// Create a queue and the worker that drains it.
    pub fn new(store: Arc<dyn ObjectStore>) -> (Self, CleanupWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, CleanupWorker { rx, store })
    }

    /// Schedule deletion of `key`. Never blocks and never fails the caller.
    pub fn enqueue(&self, key: String) {
        debug!(key = %key, "Scheduling storage object deletion");
        if let Err(e) = self.tx.send(key) {
            warn!(key = %e.0, "Cleanup worker is not running, storage object will be orphaned");
        }
    }

    pub fn enqueue_all(&self, keys: impl IntoIterator<Item = String>) {
        for key in keys {
            self.enqueue(key);
        }
    }
}

pub struct CleanupWorker {
    rx: mpsc::UnboundedReceiver<String>,
    store: Arc<dyn ObjectStore>,
}

impl CleanupWorker {
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Process deletions until every queue handle is dropped or `shutdown` fires. Keys already
    /// queued at shutdown are still processed.
    pub async fn run(mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                key = self.rx.recv() => match key {
                    Some(key) => self.delete(key).await,
                    None => break,
                },
                _ = shutdown.cancelled() => {
                    self.rx.close();
                    while let Some(key) = self.rx.recv().await {
                        self.delete(key).await;
                    }
                    break;
                }
            }
        }
        info!("Storage cleanup worker stopped");
    }

    async fn delete(&self, key: String) {
        match self.store.delete_object(&key).await {
            Ok(()) => debug!(key = %key, "Deleted storage object"),
            Err(e) => warn!(key = %key, error = %e, "Failed to delete storage object"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingStore, StoreCall, test_object_urls};

    #[derive(Default)]
    struct Record {
        video_url: Option<String>,
        video_key: Option<String>,
        thumbnail_url: Option<String>,
        thumbnail_key: Option<String>,
    }

    impl StoredMedia for Record {
        fn stored_media(&self) -> Vec<StoredRef<'_>> {
            vec![
                StoredRef::new(MediaField::Video, &self.video_url, &self.video_key),
                StoredRef::new(MediaField::Thumbnail, &self.thumbnail_url, &self.thumbnail_key),
            ]
        }
    }

    fn with_video(key: &str) -> Record {
        Record {
            video_url: Some(format!("https://media.example.com/{key}")),
            video_key: Some(key.to_string()),
            ..Default::default()
        }
    }

    fn deletions(store: &RecordingStore) -> Vec<String> {
        store
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Delete { key } => Some(key),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_replaced_key_detected_once() {
        let urls = test_object_urls();
        let before = with_video("portfolio/1-old.mp4");
        let after = with_video("portfolio/2-new.mp4");

        assert_eq!(replaced_keys(&urls, &before, &after), vec!["portfolio/1-old.mp4".to_string()]);
    }

    #[test]
    fn test_unchanged_key_not_deleted() {
        let urls = test_object_urls();
        let before = with_video("portfolio/1-same.mp4");
        let after = with_video("portfolio/1-same.mp4");

        assert!(replaced_keys(&urls, &before, &after).is_empty());
    }

    #[test]
    fn test_key_recovered_from_url_when_not_stored() {
        let urls = test_object_urls();
        let before = Record {
            thumbnail_url: Some("https://acct.r2.cloudflarestorage.com/studio-media/thumbnails/1-a.jpg".to_string()),
            ..Default::default()
        };
        let after = Record {
            thumbnail_url: Some("https://media.example.com/thumbnails/2-b.jpg".to_string()),
            thumbnail_key: Some("thumbnails/2-b.jpg".to_string()),
            ..Default::default()
        };

        assert_eq!(replaced_keys(&urls, &before, &after), vec!["thumbnails/1-a.jpg".to_string()]);
    }

    #[test]
    fn test_cleared_field_is_released() {
        let urls = test_object_urls();
        let before = with_video("reels/1-r.mp4");
        let after = Record::default();

        assert_eq!(replaced_keys(&urls, &before, &after), vec!["reels/1-r.mp4".to_string()]);
    }

    #[test]
    fn test_external_urls_are_never_released() {
        let urls = test_object_urls();
        let before = Record {
            video_url: Some("https://vimeo.com/12345".to_string()),
            ..Default::default()
        };

        assert!(replaced_keys(&urls, &before, &Record::default()).is_empty());
        assert!(owned_keys(&urls, &before).is_empty());
    }

    #[test]
    fn test_owned_keys() {
        let urls = test_object_urls();
        let mut record = with_video("showreel/1-s.mp4");
        record.thumbnail_key = Some("thumbnails/1-s.jpg".to_string());

        assert_eq!(
            owned_keys(&urls, &record),
            vec!["showreel/1-s.mp4".to_string(), "thumbnails/1-s.jpg".to_string()]
        );
    }

    #[tokio::test]
    async fn test_worker_deletes_each_key_once() {
        let store = Arc::new(RecordingStore::new());
        let (queue, worker) = CleanupQueue::new(store.clone());

        queue.enqueue("portfolio/1-old.mp4".to_string());
        queue.enqueue_all(vec!["thumbnails/1-old.jpg".to_string()]);
        drop(queue);
        worker.run(CancellationToken::new()).await;

        assert_eq!(
            deletions(&store),
            vec!["portfolio/1-old.mp4".to_string(), "thumbnails/1-old.jpg".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_deletion_is_swallowed() {
        let store = Arc::new(RecordingStore::new());
        store.fail_delete(true);
        let (queue, worker) = CleanupQueue::new(store.clone());

        queue.enqueue("a".to_string());
        queue.enqueue("b".to_string());
        drop(queue);
        worker.run(CancellationToken::new()).await;

        // Both attempted despite the first failing
        assert_eq!(deletions(&store), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_shutdown_drains_pending_keys() {
        let store = Arc::new(RecordingStore::new());
        let (queue, worker) = CleanupQueue::new(store.clone());
        let shutdown = CancellationToken::new();

        queue.enqueue("x".to_string());
        shutdown.cancel();
        worker.run(shutdown).await;

        assert_eq!(deletions(&store), vec!["x".to_string()]);

        // Enqueueing after the worker stopped only logs
        queue.enqueue("y".to_string());
        assert_eq!(deletions(&store).len(), 1);
    }
}
