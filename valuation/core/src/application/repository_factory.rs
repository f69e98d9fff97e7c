// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository implementations based on storage backend
//! configuration, keeping the domain layer free of infrastructure choices.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Select in-memory or PostgreSQL repositories at startup

use std::sync::Arc;

use crate::domain::repository::{CaseRepository, StorageBackend, WorkflowMirrorRepository};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::postgres_case::PostgresCaseRepository;
use crate::infrastructure::repositories::postgres_workflow_mirror::PostgresWorkflowMirrorRepository;
use crate::infrastructure::repositories::{InMemoryCaseRepository, InMemoryWorkflowMirrorRepository};

/// Repositories for one storage backend
#[derive(Clone)]
pub struct Repositories {
    pub cases: Arc<dyn CaseRepository>,
    pub mirror: Arc<dyn WorkflowMirrorRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            cases: Arc::new(InMemoryCaseRepository::new()),
            mirror: Arc::new(InMemoryWorkflowMirrorRepository::new()),
        }
    }
}

/// Creates the repositories for the configured backend, connecting to
/// PostgreSQL when required
pub async fn create_repositories(backend: &StorageBackend) -> anyhow::Result<Repositories> {
    match backend {
        StorageBackend::InMemory => Ok(Repositories::in_memory()),
        StorageBackend::PostgreSQL(config) => {
            let db = Database::new(&config.connection_string, config.max_connections).await?;
            Ok(Repositories {
                cases: create_case_repository(backend, Some(&db)),
                mirror: create_workflow_mirror_repository(backend, Some(&db)),
            })
        }
    }
}

/// Creates a CaseRepository implementation based on the configured backend
pub fn create_case_repository(
    backend: &StorageBackend,
    db: Option<&Database>,
) -> Arc<dyn CaseRepository> {
    match (backend, db) {
        (StorageBackend::PostgreSQL(_), Some(db)) => {
            Arc::new(PostgresCaseRepository::new(db.get_pool().clone()))
        }
        _ => Arc::new(InMemoryCaseRepository::new()),
    }
}

/// Creates a WorkflowMirrorRepository implementation based on the configured backend
pub fn create_workflow_mirror_repository(
    backend: &StorageBackend,
    db: Option<&Database>,
) -> Arc<dyn WorkflowMirrorRepository> {
    match (backend, db) {
        (StorageBackend::PostgreSQL(_), Some(db)) => {
            Arc::new(PostgresWorkflowMirrorRepository::new(db.get_pool().clone()))
        }
        _ => Arc::new(InMemoryWorkflowMirrorRepository::new()),
    }
}
