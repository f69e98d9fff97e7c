// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Case
//!
//! Stores each valuation case as one JSONB document in `valuation_cases`,
//! keyed by `(id, partition_key)`. The `version` column guards every write:
//! inserts only succeed when no row exists, updates only when the stored
//! version still matches.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements CaseRepository over PostgreSQL

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::case::{CaseKey, CaseStatus, ValuationCase};
use crate::domain::repository::{CaseRepository, RepositoryError};

pub struct PostgresCaseRepository {
    pool: PgPool,
}

impl PostgresCaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn stored_version(
        &self,
        id: &str,
        partition_key: &str,
    ) -> Result<Option<u64>, RepositoryError> {
        let version: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM valuation_cases WHERE id = $1 AND partition_key = $2",
        )
        .bind(id)
        .bind(partition_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(version.map(|v| v as u64))
    }
}

fn parse_case_row(row: PgRow) -> Result<ValuationCase, RepositoryError> {
    let document: serde_json::Value = row
        .try_get("document")
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
    let version: i64 = row
        .try_get("version")
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

    let mut case: ValuationCase = serde_json::from_value(document)?;
    case.version = version as u64;
    Ok(case)
}

#[async_trait]
impl CaseRepository for PostgresCaseRepository {
    async fn load(&self, key: &CaseKey) -> Result<Option<ValuationCase>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT document, version
            FROM valuation_cases
            WHERE id = $1 AND partition_key = $2
            "#,
        )
        .bind(&key.valuation_id)
        .bind(key.partition_key())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(parse_case_row).transpose()
    }

    async fn save(&self, case: &ValuationCase) -> Result<u64, RepositoryError> {
        let next_version = case.version + 1;
        let mut stored = case.clone();
        stored.version = next_version;
        let document = serde_json::to_value(&stored)?;

        let result = (if case.is_new() {
            sqlx::query(
                r#"
                INSERT INTO valuation_cases (
                    id, partition_key, status, document, version, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (id, partition_key) DO NOTHING
                "#,
            )
            .bind(&case.id)
            .bind(&case.partition_key)
            .bind(case.status.as_str())
            .bind(&document)
            .bind(next_version as i64)
            .bind(case.created_at)
            .bind(case.updated_at)
            .execute(&self.pool)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE valuation_cases
                SET status = $3, document = $4, version = $5, updated_at = $6
                WHERE id = $1 AND partition_key = $2 AND version = $7
                "#,
            )
            .bind(&case.id)
            .bind(&case.partition_key)
            .bind(case.status.as_str())
            .bind(&document)
            .bind(next_version as i64)
            .bind(case.updated_at)
            .bind(case.version as i64)
            .execute(&self.pool)
            .await
        })
        .map_err(|e| RepositoryError::Database(format!("Failed to save case {}: {}", case.id, e)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict {
                id: case.id.clone(),
                expected: case.version,
                actual: self.stored_version(&case.id, &case.partition_key).await?,
            });
        }

        Ok(next_version)
    }

    async fn find_by_status(
        &self,
        status: CaseStatus,
    ) -> Result<Vec<ValuationCase>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT document, version
            FROM valuation_cases
            WHERE status = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(parse_case_row).collect()
    }
}
