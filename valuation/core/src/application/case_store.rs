// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Case Store
//!
//! Thin application facade over [`CaseRepository`] implementing the
//! read-or-create and strict-read policies every service shares, plus the
//! case-level read and soft delete.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::error::{ServiceError, ServiceResult};
use crate::domain::case::{CaseKey, ValuationCase};
use crate::domain::repository::CaseRepository;

#[derive(Clone)]
pub struct CaseStore {
    repository: Arc<dyn CaseRepository>,
}

impl CaseStore {
    pub fn new(repository: Arc<dyn CaseRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn CaseRepository> {
        &self.repository
    }

    pub async fn find(&self, key: &CaseKey) -> ServiceResult<Option<ValuationCase>> {
        Ok(self.repository.load(key).await?)
    }

    /// Stored case, or [`ServiceError::NotFound`]
    pub async fn require(&self, key: &CaseKey) -> ServiceResult<ValuationCase> {
        self.find(key)
            .await?
            .ok_or_else(|| ServiceError::case_not_found(key))
    }

    /// Stored case, or a fresh open case with the standard workflow
    pub async fn load_or_new(&self, key: &CaseKey) -> ServiceResult<ValuationCase> {
        match self.find(key).await? {
            Some(case) => Ok(case),
            None => {
                debug!(valuation_id = %key.valuation_id, "Materializing new case");
                Ok(ValuationCase::new(key, Utc::now()))
            }
        }
    }

    /// Write the whole document back and advance `case.version`.
    pub async fn save(&self, case: &mut ValuationCase) -> ServiceResult<()> {
        case.touch(Utc::now());
        let version = self.repository.save(case).await?;
        case.version = version;
        Ok(())
    }

    pub async fn get_case(&self, key: &CaseKey) -> ServiceResult<ValuationCase> {
        self.require(key).await
    }

    /// Soft delete; an absent case is left absent.
    pub async fn delete_case(&self, key: &CaseKey) -> ServiceResult<()> {
        let Some(mut case) = self.find(key).await? else {
            debug!(valuation_id = %key.valuation_id, "Delete of absent case ignored");
            return Ok(());
        };
        case.mark_deleted(Utc::now());
        self.save(&mut case).await?;
        info!(valuation_id = %key.valuation_id, "Valuation case deleted");
        Ok(())
    }
}
