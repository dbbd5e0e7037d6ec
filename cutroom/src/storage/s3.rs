//! S3-compatible object store backed by `aws-sdk-s3`.
//!
//! Works against AWS S3, Cloudflare R2 and MinIO. The client is built once at startup.

use std::time::Duration;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{Client, error::DisplayErrorContext, presigning::PresigningConfig, primitives::ByteStream};
use bytes::Bytes;
use tracing::{debug, instrument};

use crate::config::StorageConfig;
use crate::storage::{ObjectStore, StorageError};

pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the storage settings. Static credentials are used when configured,
    /// otherwise the default AWS provider chain (env, profile, instance metadata).
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint);

        if let (Some(access_key_id), Some(secret_access_key)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                None,
                None,
                "cutroom-config",
            ));
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        debug!(endpoint = %config.endpoint, bucket = %config.bucket, "Object store client configured");
        Self::new(Client::from_conf(s3_config), config.bucket.clone())
    }

    fn presigning(key: &str, operation: &str, expires_in: Duration) -> Result<PresigningConfig, StorageError> {
        PresigningConfig::expires_in(expires_in).map_err(|e| StorageError::Presign {
            operation: operation.to_string(),
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    #[instrument(skip(self), err)]
    async fn presign_put(&self, key: &str, content_type: &str, cache_control: &str, expires_in: Duration) -> Result<String, StorageError> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .cache_control(cache_control)
            .presigned(Self::presigning(key, "PUT", expires_in)?)
            .await
            .map_err(|e| StorageError::Presign {
                operation: "PUT".to_string(),
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(presigned.uri().to_string())
    }

    #[instrument(skip(self), err)]
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presigning(key, "GET", expires_in)?)
            .await
            .map_err(|e| StorageError::Presign {
                operation: "GET".to_string(),
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(presigned.uri().to_string())
    }

    #[instrument(skip(self, body), fields(size = body.len()), err)]
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str, cache_control: &str) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .cache_control(cache_control)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Request {
                operation: format!("put object {key}"),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Request {
                operation: format!("delete object {key}"),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> S3Store {
        S3Store::from_config(&StorageConfig {
            endpoint: "http://localhost:9000".to_string(),
            region: "us-east-1".to_string(),
            bucket: "cutroom-test".to_string(),
            access_key_id: Some("minioadmin".to_string()),
            secret_access_key: Some("minioadmin".to_string()),
            ..Default::default()
        })
        .await
    }

    // Presigning is computed locally, so these run without a live store.
    #[tokio::test]
    async fn test_presign_put_binds_key_and_expiry() {
        let url = store()
            .await
            .presign_put("portfolio/1-clip.mp4", "video/mp4", "public, max-age=31536000, immutable", Duration::from_secs(3600))
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:9000/cutroom-test/portfolio/1-clip.mp4?"), "{url}");
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    async fn test_presign_get() {
        let url = store()
            .await
            .presign_get("team/2-jo.png", Duration::from_secs(600))
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:9000/cutroom-test/team/2-jo.png?"), "{url}");
        assert!(url.contains("X-Amz-Expires=600"));
    }
}
