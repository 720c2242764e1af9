//! Image storage: the blob store contract and the upload/delete orchestration over it

mod error;
pub mod keys;
#[cfg(any(test, feature = "test-utils"))]
mod memory;
mod s3;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, info};

pub use error::{StorageError, StorageResult};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::{InMemoryBlobStore, StoredObject};
pub use s3::S3BlobStore;

/// A file received from a client, held in memory until stored
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Display name supplied by the client
    pub name: String,
    /// Declared MIME type
    pub content_type: String,
    /// File contents
    pub bytes: Bytes,
}

impl UploadFile {
    /// Creates an upload file
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Size of the contents in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Blob store collaborator the gateway writes to
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the object's public URL
    async fn store(&self, bytes: Bytes, content_type: &str, key: &str) -> StorageResult<String>;

    /// Removes the object stored under `key`
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Orchestrates batch uploads and single deletes against a [`BlobStore`]
pub struct MediaStorage {
    store: Arc<dyn BlobStore>,
}

impl MediaStorage {
    /// Creates the orchestrator over a store
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Stores every file concurrently and returns their URLs in input order
    ///
    /// Files stored before a failure are not rolled back.
    ///
    /// # Errors
    ///
    /// Returns the first `StorageError` raised by any store call
    pub async fn upload_batch(
        &self,
        files: Vec<UploadFile>,
        folder: Option<&str>,
    ) -> StorageResult<Vec<String>> {
        let count = files.len();
        let uploads = files.into_iter().map(|file| self.upload_one(file, folder));

        let urls = try_join_all(uploads).await?;

        info!(count, "Stored upload batch");
        Ok(urls)
    }

    async fn upload_one(&self, file: UploadFile, folder: Option<&str>) -> StorageResult<String> {
        let key = keys::storage_key(folder, &file.name, Utc::now().timestamp_millis());
        debug!(key = %key, size = file.size(), "Storing object");

        self.store.store(file.bytes, &file.content_type, &key).await
    }

    /// Removes the object behind a public URL
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidUrl` without contacting the store when the
    /// URL carries no key, or the store's error unchanged
    pub async fn delete_one(&self, public_url: &str) -> StorageResult<()> {
        let key = keys::recover_key(public_url)?;
        debug!(key = %key, "Removing object");

        self.store.remove(&key).await?;

        info!(key = %key, "Removed object");
        Ok(())
    }
}
