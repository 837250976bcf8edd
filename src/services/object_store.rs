//! src/services/object_store.rs
//!
//! Object storage seam. `ObjectStore` is the contract the photo service depends
//! on; `S3ObjectStore` implements it with the AWS SDK and works against AWS S3
//! as well as MinIO/LocalStack (custom endpoint + path-style addressing).

use crate::config::S3Settings;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client as S3Client, config::Builder as S3ConfigBuilder, error::DisplayErrorContext,
    presigning::PresigningConfig, primitives::ByteStream,
};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use std::{collections::HashMap, time::Duration};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to put object `{key}`: {reason}")]
    Put { key: String, reason: String },
    #[error("failed to delete object `{key}`: {reason}")]
    Delete { key: String, reason: String },
    #[error("failed to head object `{key}`: {reason}")]
    Head { key: String, reason: String },
    #[error("failed to presign object `{key}`: {reason}")]
    Presign { key: String, reason: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Blob operations required by the gallery, addressed by key within one bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` under `key` with the given content type, length and user metadata.
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        size: u64,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()>;

    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// `Ok(false)` only when the store reports the key as missing.
    async fn head_exists(&self, key: &str) -> StorageResult<bool>;

    /// Time-limited GET URL for `key`.
    async fn presign_get(&self, key: &str, ttl: Duration) -> StorageResult<String>;
}

/// `ObjectStore` backed by a single S3 bucket.
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build the SDK client once; credentials come from the default provider chain.
    pub async fn new(settings: &S3Settings) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(settings.region.clone()))
            .load()
            .await;

        let mut builder = S3ConfigBuilder::from(&aws_config);
        if let Some(endpoint) = settings.endpoint_url.as_deref() {
            builder = builder.endpoint_url(endpoint);
        }
        if settings.force_path_style {
            builder = builder.force_path_style(true);
        }

        info!(
            bucket = %settings.bucket,
            region = %settings.region,
            endpoint = ?settings.endpoint_url,
            "S3 object store initialized"
        );

        Self::from_client(S3Client::from_conf(builder.build()), settings.bucket.clone())
    }

    pub fn from_client(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, body, metadata), fields(bucket = %self.bucket))]
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        size: u64,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()> {
        let content_md5 = content_md5(&body);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(size as i64)
            .content_md5(content_md5)
            .set_metadata(Some(metadata))
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StorageError::Put {
                key: key.to_string(),
                reason: DisplayErrorContext(&err).to_string(),
            })?;

        info!(key, size, "uploaded object");
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StorageError::Delete {
                key: key.to_string(),
                reason: DisplayErrorContext(&err).to_string(),
            })?;

        info!(key, "deleted object");
        Ok(())
    }

    async fn head_exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false) =>
            {
                Ok(false)
            }
            Err(err) => Err(StorageError::Head {
                key: key.to_string(),
                reason: DisplayErrorContext(&err).to_string(),
            }),
        }
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        let presign_err = |reason: String| StorageError::Presign {
            key: key.to_string(),
            reason,
        };

        let presigning_config =
            PresigningConfig::expires_in(ttl).map_err(|err| presign_err(err.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|err| presign_err(DisplayErrorContext(&err).to_string()))?;

        debug!(key, "generated presigned URL");
        Ok(presigned.uri().to_string())
    }
}

/// Base64 MD5 digest sent as `Content-MD5` so the bucket rejects corrupted bodies.
fn content_md5(body: &[u8]) -> String {
    general_purpose::STANDARD.encode(md5::compute(body).0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{Credentials, Region};

    fn offline_store() -> S3ObjectStore {
        let conf = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .build();
        S3ObjectStore::from_client(S3Client::from_conf(conf), "gallery-bucket")
    }

    #[test]
    fn content_md5_matches_known_digest() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(content_md5(b""), "1B2M2Y8AsgTpgAmY7PhCfw==");
    }

    #[tokio::test]
    async fn presigned_url_targets_bucket_and_key_with_expiry() {
        let store = offline_store();
        let url = store
            .presign_get("photos/abc.png", Duration::from_secs(2 * 24 * 60 * 60))
            .await
            .unwrap();

        assert!(url.contains("gallery-bucket"));
        assert!(url.contains("photos/abc.png"));
        assert!(url.contains("X-Amz-Expires=172800"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    async fn presign_rejects_ttl_beyond_sdk_limit() {
        let store = offline_store();
        let err = store
            .presign_get("photos/abc.png", Duration::from_secs(8 * 24 * 60 * 60))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Presign { .. }));
    }
}
