// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for the case aggregate and the workflow mirror,
//! defined in the domain layer and implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Record | Implementations |
//! |-------|--------|----------------|
//! | `CaseRepository` | `ValuationCase` | `InMemoryCaseRepository`, `PostgresCaseRepository` |
//! | `WorkflowMirrorRepository` | `WorkflowMirrorRecord` | `InMemoryWorkflowMirrorRepository`, `PostgresWorkflowMirrorRepository` |
//!
//! ## Storage Backend Abstraction
//!
//! The backend is chosen at startup from `storage.backend` in
//! `valuation-config.yaml`. In-memory storage serves development and tests;
//! PostgreSQL stores each case as one JSONB document.

use async_trait::async_trait;

use crate::domain::case::{CaseKey, CaseStatus, ValuationCase};
use crate::domain::mirror::WorkflowMirrorRecord;

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

/// Repository interface for the case aggregate.
///
/// There is no partial update; callers load, mutate and save the whole
/// document.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Single-document read by id and partition key
    async fn load(&self, key: &CaseKey) -> Result<Option<ValuationCase>, RepositoryError>;

    /// Full-document upsert guarded by `case.version`.
    ///
    /// A new case (`version == 0`) must not exist yet; an existing case must
    /// still be at `case.version`. Otherwise the write fails with
    /// [`RepositoryError::Conflict`]. Returns the stored version.
    async fn save(&self, case: &ValuationCase) -> Result<u64, RepositoryError>;

    /// All cases with `status`
    async fn find_by_status(
        &self,
        status: CaseStatus,
    ) -> Result<Vec<ValuationCase>, RepositoryError>;
}

/// Repository interface for the workflow mirror table
#[async_trait]
pub trait WorkflowMirrorRepository: Send + Sync {
    /// Insert or replace the row, keeping `created_at` of an existing row
    async fn upsert(&self, record: &WorkflowMirrorRecord) -> Result<(), RepositoryError>;

    async fn get(
        &self,
        partition_key: &str,
        valuation_id: &str,
    ) -> Result<Option<WorkflowMirrorRecord>, RepositoryError>;

    /// Removing an absent row is not an error
    async fn delete(&self, partition_key: &str, valuation_id: &str) -> Result<(), RepositoryError>;

    async fn list_in_progress(&self) -> Result<Vec<WorkflowMirrorRecord>, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Concurrent modification of {id}: expected version {expected}, found {actual:?}")]
    Conflict {
        id: String,
        expected: u64,
        actual: Option<u64>,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
