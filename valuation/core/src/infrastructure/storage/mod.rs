// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Blob Storage Infrastructure Module
//!
//! Concrete implementations of the [`BlobStore`] trait.

pub mod local;

pub use local::LocalBlobStore;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::config::{BlobConfig, BlobKind};
use crate::domain::storage::{BlobStore, StorageError};

/// Factory function to create the blob store from configuration
pub fn create_blob_store(config: &BlobConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    match config.backend {
        BlobKind::InMemory => Ok(Arc::new(InMemoryBlobStore::new(config.public_base_url.clone()))),
        BlobKind::Local => {
            let root = config.root.clone().ok_or_else(|| {
                StorageError::InvalidPath("blob.root is not configured".to_string())
            })?;
            Ok(Arc::new(LocalBlobStore::new(root, config.public_base_url.clone())?))
        }
    }
}

/// Process-local blob store for development and tests
#[derive(Clone)]
pub struct InMemoryBlobStore {
    base_url: String,
    blobs: Arc<RwLock<HashMap<String, (String, Bytes)>>>,
}

impl InMemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            blobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Stored content type and bytes for `url`
    pub fn get(&self, url: &str) -> Option<(String, Bytes)> {
        self.blobs.read().get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://blobs")
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if path.is_empty() {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        let url = format!("{}/{}", self.base_url, path);
        self.blobs
            .write()
            .insert(url.clone(), (content_type.to_string(), bytes));
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        self.blobs
            .write()
            .remove(url)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryBlobStore::default();
        let url = store
            .upload("KA01/99/x-a.jpg", Bytes::from_static(b"jpg"), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(url, "memory://blobs/KA01/99/x-a.jpg");
        assert_eq!(store.get(&url).unwrap().0, "image/jpeg");
        store.delete(&url).await.unwrap();
        assert!(store.is_empty());
        assert!(store.delete(&url).await.is_err());
    }

    #[test]
    fn test_local_backend_requires_root() {
        let config = BlobConfig {
            backend: BlobKind::Local,
            root: None,
            ..Default::default()
        };
        assert!(create_blob_store(&config).is_err());
    }
}
