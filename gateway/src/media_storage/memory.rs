//! In-memory blob store for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use axum::body::Bytes;

use super::{keys, BlobStore, StorageError, StorageResult};

/// An object held by [`InMemoryBlobStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Declared MIME type
    pub content_type: String,
    /// Object contents
    pub bytes: Bytes,
}

/// Blob store that keeps objects in a map and counts calls
#[derive(Debug)]
pub struct InMemoryBlobStore {
    public_base: String,
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_fragment: Mutex<Option<String>>,
    store_calls: AtomicUsize,
    remove_calls: AtomicUsize,
}

impl InMemoryBlobStore {
    /// Creates an empty store whose URLs are built on `public_base`
    #[must_use]
    pub fn new(public_base: impl Into<String>) -> Self {
        Self {
            public_base: public_base.into(),
            objects: Mutex::new(HashMap::new()),
            fail_fragment: Mutex::new(None),
            store_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
        }
    }

    /// Makes every later store call whose key contains `fragment` fail
    pub fn fail_store_when_key_contains(&self, fragment: impl Into<String>) {
        *lock(&self.fail_fragment) = Some(fragment.into());
    }

    /// Object stored under `key`, if any
    #[must_use]
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        lock(&self.objects).get(key).cloned()
    }

    /// Keys currently stored, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.objects).keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of stored objects
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    /// Whether the store holds no objects
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store calls received, including failed ones
    #[must_use]
    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    /// Remove calls received, including failed ones
    #[must_use]
    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn store(&self, bytes: Bytes, content_type: &str, key: &str) -> StorageResult<String> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);

        if lock(&self.fail_fragment)
            .as_deref()
            .is_some_and(|fragment| key.contains(fragment))
        {
            return Err(StorageError::UpstreamError(format!(
                "injected failure storing {key}"
            )));
        }

        lock(&self.objects).insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                bytes,
            },
        );

        Ok(keys::public_url(&self.public_base, key))
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);

        lock(&self.objects)
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
