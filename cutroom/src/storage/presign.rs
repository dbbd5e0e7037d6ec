//! Issuing upload targets.
//!
//! Large media goes straight from the browser to the bucket: the admin UI asks for a presigned
//! PUT, uploads, then submits the returned `key`/`publicUrl` with the record. Small legacy
//! uploads still come through the server as multipart and use [`UploadIssuer::upload`], which
//! applies the same key layout and cache policy.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::errors::{Error, FieldError, Result};
use crate::storage::{
    ObjectStore, ObjectUrls, StorageObjectReference,
    keys::{UploadFolder, cache_control_for, object_key},
};

/// Longest file name accepted before sanitizing.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Headers the uploader must send with the presigned PUT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UploadHeaders {
    #[serde(rename = "Content-Type")]
    pub content_type: String,
    #[serde(rename = "Cache-Control")]
    pub cache_control: String,
}

/// A presigned upload target.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub upload_url: String,
    pub key: String,
    pub public_url: String,
    pub headers: UploadHeaders,
}

/// A validated upload: where it goes and how it is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    pub folder: UploadFolder,
    pub key: String,
    pub content_type: String,
    pub cache_control: &'static str,
}

impl UploadPlan {
    /// Validate the inputs and lay out the object key. Every problem is reported, not just the first.
    pub fn new(file_name: &str, content_type: &str, folder: &str) -> Result<Self> {
        let mut fields = Vec::new();

        if file_name.trim().is_empty() {
            fields.push(FieldError::new("fileName", "fileName is required"));
        } else if file_name.chars().count() > MAX_FILE_NAME_LEN {
            fields.push(FieldError::new(
                "fileName",
                format!("fileName must be at most {MAX_FILE_NAME_LEN} characters"),
            ));
        }

        let content_type = content_type.trim();
        if content_type.is_empty() {
            fields.push(FieldError::new("contentType", "contentType is required"));
        }

        let folder = match folder.parse::<UploadFolder>() {
            Ok(folder) => Some(folder),
            Err(e) => {
                fields.push(FieldError::new("folder", e.to_string()));
                None
            }
        };

        if let Some(folder) = folder
            && !content_type.is_empty()
            && !folder.accepts(content_type)
        {
            fields.push(FieldError::new(
                "contentType",
                format!(
                    "Content type '{content_type}' is not allowed in folder '{folder}' (expected {})",
                    folder.accepted_description()
                ),
            ));
        }

        match folder {
            Some(folder) if fields.is_empty() => Ok(Self {
                folder,
                key: object_key(folder, file_name, Utc::now().timestamp_millis()),
                content_type: content_type.to_string(),
                cache_control: cache_control_for(content_type),
            }),
            _ => Err(Error::Validation { fields }),
        }
    }
}

/// Issues presigned PUT URLs and performs server-side uploads.
#[derive(Clone)]
pub struct UploadIssuer {
    store: Arc<dyn ObjectStore>,
    urls: Arc<ObjectUrls>,
    expires_in: Duration,
}

impl UploadIssuer {
    pub fn new(store: Arc<dyn ObjectStore>, urls: Arc<ObjectUrls>, expires_in: Duration) -> Self {
        Self { store, urls, expires_in }
    }

    /// Validate the request and presign a PUT for a fresh key. Nothing is written to the store.
    #[instrument(skip(self), err)]
    pub async fn issue(&self, file_name: &str, content_type: &str, folder: &str) -> Result<PresignedUpload> {
        let plan = UploadPlan::new(file_name, content_type, folder)?;

        let upload_url = self
            .store
            .presign_put(&plan.key, &plan.content_type, plan.cache_control, self.expires_in)
            .await?;

        Ok(PresignedUpload {
            upload_url,
            public_url: self.urls.public_url(&plan.key),
            headers: UploadHeaders {
                content_type: plan.content_type,
                cache_control: plan.cache_control.to_string(),
            },
            key: plan.key,
        })
    }

    /// Upload a buffered file under `folder` and return where it landed.
    #[instrument(skip(self, body), fields(size = body.len()), err)]
    pub async fn upload(&self, folder: UploadFolder, file_name: &str, content_type: &str, body: Bytes) -> Result<StorageObjectReference> {
        let plan = UploadPlan::new(file_name, content_type, folder.as_str())?;

        self.store
            .put_object(&plan.key, body, &plan.content_type, plan.cache_control)
            .await?;

        info!(key = %plan.key, "Stored uploaded file");
        Ok(StorageObjectReference {
            url: self.urls.public_url(&plan.key),
            key: plan.key,
        })
    }
}
