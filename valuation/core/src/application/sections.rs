// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Section Service
//!
//! One generic read / patch / delete implementation shared by every
//! [`CaseSection`]:
//!
//! - `get` never fails on absence and returns the section default.
//! - `upsert` loads or creates the case, uploads every file concurrently,
//!   assembles the new section and saves the whole document. A failed upload
//!   aborts before anything is saved.
//! - `delete` clears the section on an existing case and creates nothing.

use chrono::Utc;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::case_store::CaseStore;
use crate::application::error::{ServiceError, ServiceResult};
use crate::domain::case::{CaseKey, ValuationCase};
use crate::domain::section::{CaseSection, UploadedFiles};
use crate::domain::storage::{blob_path, BlobStore, FileUpload, UploadedFile};

#[derive(Clone)]
pub struct SectionService {
    store: CaseStore,
    blobs: Arc<dyn BlobStore>,
}

impl SectionService {
    pub fn new(store: CaseStore, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    pub fn store(&self) -> &CaseStore {
        &self.store
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub async fn get<S: CaseSection>(&self, key: &CaseKey) -> ServiceResult<S> {
        let section = self
            .store
            .find(key)
            .await?
            .and_then(|case| S::current(&case).cloned())
            .unwrap_or_default();
        Ok(section)
    }

    pub async fn upsert<S: CaseSection>(
        &self,
        key: &CaseKey,
        payload: S,
        files: Vec<FileUpload>,
    ) -> ServiceResult<S> {
        let (section, _) = self.upsert_with(key, payload, files, |_| {}).await?;
        Ok(section)
    }

    /// `upsert` with a hook that may adjust the case just before it is saved.
    /// Returns the stored section together with the saved case.
    pub async fn upsert_with<S, F>(
        &self,
        key: &CaseKey,
        payload: S,
        files: Vec<FileUpload>,
        before_save: F,
    ) -> ServiceResult<(S, ValuationCase)>
    where
        S: CaseSection,
        F: FnOnce(&mut ValuationCase),
    {
        if let Some(file) = files.iter().find(|f| !S::accepts_field(&f.field)) {
            return Err(ServiceError::Validation(format!(
                "Field '{}' does not accept files for {}",
                file.field,
                S::NAME
            )));
        }

        let mut case = self.store.load_or_new(key).await?;
        let uploaded = self.upload_all(key, files).await?;

        let current = S::slot(&mut case).take();
        let section = S::assemble(payload, current, &uploaded);
        *S::slot(&mut case) = Some(section.clone());
        before_save(&mut case);

        self.store.save(&mut case).await?;

        metrics::counter!("valuation_section_writes_total", "section" => S::NAME).increment(1);
        info!(
            valuation_id = %key.valuation_id,
            section = S::NAME,
            files = uploaded.iter().count(),
            version = case.version,
            "Section updated"
        );
        Ok((section, case))
    }

    pub async fn delete<S: CaseSection>(&self, key: &CaseKey) -> ServiceResult<()> {
        let Some(mut case) = self.store.find(key).await? else {
            debug!(
                valuation_id = %key.valuation_id,
                section = S::NAME,
                "Delete on absent case ignored"
            );
            return Ok(());
        };
        *S::slot(&mut case) = None;
        self.store.save(&mut case).await?;
        info!(valuation_id = %key.valuation_id, section = S::NAME, "Section cleared");
        Ok(())
    }

    /// Upload every file concurrently; all must succeed.
    pub async fn upload_all(
        &self,
        key: &CaseKey,
        files: Vec<FileUpload>,
    ) -> ServiceResult<UploadedFiles> {
        if files.is_empty() {
            return Ok(UploadedFiles::default());
        }

        let uploads = files.into_iter().map(|file| {
            let blobs = Arc::clone(&self.blobs);
            let path = blob_path(key, &file.file_name);
            async move {
                let url = blobs
                    .upload(&path, file.bytes, &file.content_type)
                    .await
                    .map_err(|e| {
                        warn!(
                            field = %file.field,
                            file_name = %file.file_name,
                            error = %e,
                            "Blob upload failed"
                        );
                        ServiceError::UploadFailure(format!("{}: {}", file.file_name, e))
                    })?;
                Ok::<_, ServiceError>(UploadedFile {
                    field: file.field,
                    file_name: file.file_name,
                    url,
                    uploaded_at: Utc::now(),
                })
            }
        });

        Ok(UploadedFiles::new(try_join_all(uploads).await?))
    }
}
