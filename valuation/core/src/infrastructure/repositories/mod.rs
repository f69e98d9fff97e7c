// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository traits defined in
//! `crate::domain::repository`.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve case documents and mirror rows
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresCaseRepository** - One JSONB document per case, version checked
//! - **PostgresWorkflowMirrorRepository** - Workflow mirror table
//!
//! ## In-Memory Repositories
//!
//! Lightweight implementations for testing and development:
//! - **InMemoryCaseRepository** - HashMap keyed by `(partition key, id)`
//! - **InMemoryWorkflowMirrorRepository** - HashMap keyed the same way
//!
//! Both in-memory stores apply the same version and `created_at` rules as
//! their PostgreSQL counterparts.

pub mod postgres_case;
pub mod postgres_workflow_mirror;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::case::{CaseKey, CaseStatus, ValuationCase};
use crate::domain::mirror::WorkflowMirrorRecord;
use crate::domain::repository::{CaseRepository, RepositoryError, WorkflowMirrorRepository};
use crate::domain::workflow::StepStatus;

type RowKey = (String, String);

#[derive(Clone, Default)]
pub struct InMemoryCaseRepository {
    cases: Arc<RwLock<HashMap<RowKey, ValuationCase>>>,
}

impl InMemoryCaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cases.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.read().is_empty()
    }
}

#[async_trait]
impl CaseRepository for InMemoryCaseRepository {
    async fn load(&self, key: &CaseKey) -> Result<Option<ValuationCase>, RepositoryError> {
        let cases = self.cases.read();
        Ok(cases
            .get(&(key.partition_key(), key.valuation_id.clone()))
            .cloned())
    }

    async fn save(&self, case: &ValuationCase) -> Result<u64, RepositoryError> {
        let row_key = (case.partition_key.clone(), case.id.clone());
        let mut cases = self.cases.write();

        let stored_version = cases.get(&row_key).map(|c| c.version);
        let expected = if case.is_new() { None } else { Some(case.version) };
        if stored_version != expected {
            return Err(RepositoryError::Conflict {
                id: case.id.clone(),
                expected: case.version,
                actual: stored_version,
            });
        }

        let mut stored = case.clone();
        stored.version = case.version + 1;
        let version = stored.version;
        cases.insert(row_key, stored);
        Ok(version)
    }

    async fn find_by_status(
        &self,
        status: CaseStatus,
    ) -> Result<Vec<ValuationCase>, RepositoryError> {
        let cases = self.cases.read();
        Ok(cases.values().filter(|c| c.status == status).cloned().collect())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryWorkflowMirrorRepository {
    rows: Arc<RwLock<HashMap<RowKey, WorkflowMirrorRecord>>>,
}

impl InMemoryWorkflowMirrorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowMirrorRepository for InMemoryWorkflowMirrorRepository {
    async fn upsert(&self, record: &WorkflowMirrorRecord) -> Result<(), RepositoryError> {
        let row_key = (record.partition_key.clone(), record.valuation_id.clone());
        let mut rows = self.rows.write();
        let mut row = record.clone();
        if let Some(existing) = rows.get(&row_key) {
            row.created_at = existing.created_at;
            row.assignment.keep_unset_from(&existing.assignment);
        }
        rows.insert(row_key, row);
        Ok(())
    }

    async fn get(
        &self,
        partition_key: &str,
        valuation_id: &str,
    ) -> Result<Option<WorkflowMirrorRecord>, RepositoryError> {
        let rows = self.rows.read();
        Ok(rows
            .get(&(partition_key.to_string(), valuation_id.to_string()))
            .cloned())
    }

    async fn delete(&self, partition_key: &str, valuation_id: &str) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write();
        rows.remove(&(partition_key.to_string(), valuation_id.to_string()));
        Ok(())
    }

    async fn list_in_progress(&self) -> Result<Vec<WorkflowMirrorRecord>, RepositoryError> {
        let rows = self.rows.read();
        let mut in_progress: Vec<_> = rows
            .values()
            .filter(|r| r.status == StepStatus::InProgress)
            .cloned()
            .collect();
        in_progress.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(in_progress)
    }
}
