// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Blob Store Trait - Anti-Corruption Layer for file storage
//!
//! Uploaded documents and photos are stored outside the case document; the
//! case only keeps the URL returned by [`BlobStore::upload`].

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::case::CaseKey;

/// A file received with a section write, not yet stored
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Form field the file arrived under
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// A stored file and where it can be fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `path` and return its URL
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Remove the blob a previously returned URL points to
    async fn delete(&self, url: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Blob path for an upload: `{vehicle}/{contact}/{uuid}-{file name}`, with
/// spaces in the file name replaced by `_`.
pub fn blob_path(key: &CaseKey, file_name: &str) -> String {
    let safe_name: String = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .replace(' ', "_");
    format!(
        "{}/{}/{}-{}",
        key.vehicle_number,
        key.applicant_contact,
        Uuid::new_v4(),
        safe_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_path_layout() {
        let key = CaseKey::new("v1", "KA01AB1234", "9876543210");
        let path = blob_path(&key, "front left.jpg");
        let parts: Vec<_> = path.split('/').collect();
        assert_eq!(parts[0], "KA01AB1234");
        assert_eq!(parts[1], "9876543210");
        assert!(parts[2].ends_with("-front_left.jpg"));
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn test_blob_path_strips_client_directories() {
        let key = CaseKey::new("v1", "KA01", "99");
        let path = blob_path(&key, "../../etc/passwd");
        assert!(path.ends_with("-passwd"));
        assert!(!path.contains(".."));
    }
}
