// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Vehicle photo slots
//!
//! Reads and writes go through the generic section service. Deleting the
//! photo section also removes the stored blobs; blob removal is best effort
//! and never blocks clearing the map.

use futures::future::join_all;
use tracing::{info, warn};

use crate::application::error::ServiceResult;
use crate::application::sections::SectionService;
use crate::domain::case::CaseKey;
use crate::domain::sections::PhotoUrls;
use crate::domain::storage::FileUpload;

#[derive(Clone)]
pub struct PhotoService {
    sections: SectionService,
}

impl PhotoService {
    pub fn new(sections: SectionService) -> Self {
        Self { sections }
    }

    pub async fn get(&self, key: &CaseKey) -> ServiceResult<PhotoUrls> {
        self.sections.get::<PhotoUrls>(key).await
    }

    /// Store the uploaded slots; slots not uploaded keep their URL.
    pub async fn upsert(
        &self,
        key: &CaseKey,
        payload: PhotoUrls,
        files: Vec<FileUpload>,
    ) -> ServiceResult<PhotoUrls> {
        self.sections.upsert::<PhotoUrls>(key, payload, files).await
    }

    pub async fn delete(&self, key: &CaseKey) -> ServiceResult<()> {
        let Some(mut case) = self.sections.store().find(key).await? else {
            return Ok(());
        };
        let Some(photos) = case.photo_urls.take() else {
            return Ok(());
        };

        let blobs = self.sections.blobs();
        let results = join_all(
            photos
                .urls()
                .map(|url| async move { (url, blobs.delete(url).await) }),
        )
        .await;
        for (url, result) in results {
            if let Err(e) = result {
                warn!(
                    valuation_id = %key.valuation_id,
                    url = %url,
                    error = %e,
                    "Failed to delete photo blob"
                );
            }
        }

        self.sections.store().save(&mut case).await?;
        info!(valuation_id = %key.valuation_id, removed = photos.len(), "Vehicle photos deleted");
        Ok(())
    }
}
