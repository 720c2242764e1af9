//! S3-backed blob store

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};
use axum::body::Bytes;
use tracing::{debug, error};

use super::{keys, BlobStore, StorageError, StorageResult};

/// Blob store writing objects into a single S3 bucket
pub struct S3BlobStore {
    s3_client: Arc<S3Client>,
    bucket_name: String,
    public_base: String,
}

impl S3BlobStore {
    /// Creates a new S3 blob store
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - Bucket objects are written to
    /// * `public_base` - Base that public object URLs are built on
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigError` if the bucket name is empty
    pub fn new(
        s3_client: Arc<S3Client>,
        bucket_name: String,
        public_base: String,
    ) -> StorageResult<Self> {
        if bucket_name.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "S3 bucket name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            s3_client,
            bucket_name,
            public_base,
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn store(&self, bytes: Bytes, content_type: &str, key: &str) -> StorageResult<String> {
        let content_length = i64::try_from(bytes.len())
            .map_err(|_| StorageError::S3Error(format!("Object too large: {key}")))?;

        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_length(content_length)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to store object {key}: {e}");
                StorageError::from(e)
            })?;

        debug!("Stored object {key} in bucket {}", self.bucket_name);

        Ok(keys::public_url(&self.public_base, key))
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.s3_client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to remove object {key}: {e}");
                StorageError::from(e)
            })?;

        debug!("Removed object {key} from bucket {}", self.bucket_name);
        Ok(())
    }
}
