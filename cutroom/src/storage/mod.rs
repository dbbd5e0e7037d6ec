//! Object storage for uploaded media.
//!
//! Videos, images and resumes live in an S3-compatible bucket (R2, MinIO, AWS). Records in
//! PostgreSQL only carry a URL and the object key it was derived from. This module owns every
//! interaction with the bucket:
//!
//! - [`presign`]: hands browsers short-lived PUT URLs so large files never pass through the server
//! - [`signing`]: rewrites private-endpoint URLs in outgoing records into short-lived GET URLs
//! - [`cleanup`]: deletes objects that were replaced or whose record was removed, off the request path
//! - [`keys`]: upload folders, file-name sanitizing, and cache policy
//! - [`urls`]: tells private URLs from public ones and recovers object keys from URLs
//!
//! All of it goes through the [`ObjectStore`] trait; [`s3::S3Store`] is the production
//! implementation, built once at startup and shared through `AppState`.

pub mod cleanup;
pub mod keys;
pub mod presign;
pub mod s3;
pub mod signing;
pub mod urls;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

pub use cleanup::{CleanupQueue, CleanupWorker};
pub use keys::UploadFolder;
pub use presign::UploadIssuer;
pub use signing::{MediaField, Signable, UrlSigner};
pub use urls::ObjectUrls;

/// Errors raised by the object store backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Could not produce a presigned URL
    #[error("Failed to presign {operation} for {key}: {message}")]
    Presign { operation: String, key: String, message: String },

    /// A request against the store failed
    #[error("Storage request failed to {operation}: {message}")]
    Request { operation: String, message: String },

    /// Store settings are unusable
    #[error("Invalid storage configuration: {message}")]
    Config { message: String },
}

/// Where an uploaded object lives: its canonical key and the URL clients use to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StorageObjectReference {
    pub url: String,
    pub key: String,
}

/// Minimal object-store surface the application relies on.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Presign a PUT for `key`. The content type and cache-control are part of the signature,
    /// so the uploader must send the same headers.
    async fn presign_put(&self, key: &str, content_type: &str, cache_control: &str, expires_in: Duration) -> Result<String, StorageError>;

    /// Presign a GET for `key`.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError>;

    /// Upload an object from memory.
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str, cache_control: &str) -> Result<(), StorageError>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;
}
