// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Workflow Mirror
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements WorkflowMirrorRepository over the
//!   `workflow_mirror` table

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::mirror::{Assignment, WorkflowMirrorRecord};
use crate::domain::repository::{RepositoryError, WorkflowMirrorRepository};
use crate::domain::workflow::StepStatus;

pub struct PostgresWorkflowMirrorRepository {
    pool: PgPool,
}

impl PostgresWorkflowMirrorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = r#"
    valuation_id, partition_key, vehicle_number, applicant_name, applicant_contact,
    location, workflow, workflow_step_order, status, created_at, completed_at,
    name, valuation_type, red_flag, remarks, assigned_to, assigned_to_role,
    assigned_to_phone_number, assigned_to_email, assigned_to_whatsapp,
    created_by, completed_by
"#;

fn parse_status(value: &str) -> Result<StepStatus, RepositoryError> {
    match value {
        "Pending" => Ok(StepStatus::Pending),
        "InProgress" => Ok(StepStatus::InProgress),
        "Completed" => Ok(StepStatus::Completed),
        other => Err(RepositoryError::Serialization(format!(
            "Unknown step status '{}'",
            other
        ))),
    }
}

fn parse_mirror_row(row: PgRow) -> Result<WorkflowMirrorRecord, RepositoryError> {
    let status: String = row.try_get("status")?;
    let step_order: i32 = row.try_get("workflow_step_order")?;
    Ok(WorkflowMirrorRecord {
        valuation_id: row.try_get("valuation_id")?,
        partition_key: row.try_get("partition_key")?,
        vehicle_number: row.try_get("vehicle_number")?,
        applicant_name: row.try_get("applicant_name")?,
        applicant_contact: row.try_get("applicant_contact")?,
        location: row.try_get("location")?,
        workflow: row.try_get("workflow")?,
        workflow_step_order: step_order as u32,
        status: parse_status(&status)?,
        created_at: row.try_get("created_at")?,
        completed_at: row.try_get("completed_at")?,
        name: row.try_get("name")?,
        valuation_type: row.try_get("valuation_type")?,
        red_flag: row.try_get("red_flag")?,
        remarks: row.try_get("remarks")?,
        assignment: Assignment {
            assigned_to: row.try_get("assigned_to")?,
            assigned_to_role: row.try_get("assigned_to_role")?,
            assigned_to_phone_number: row.try_get("assigned_to_phone_number")?,
            assigned_to_email: row.try_get("assigned_to_email")?,
            assigned_to_whatsapp: row.try_get("assigned_to_whatsapp")?,
            created_by: row.try_get("created_by")?,
            completed_by: row.try_get("completed_by")?,
        },
    })
}

#[async_trait]
impl WorkflowMirrorRepository for PostgresWorkflowMirrorRepository {
    async fn upsert(&self, record: &WorkflowMirrorRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO workflow_mirror (
                valuation_id, partition_key, vehicle_number, applicant_name, applicant_contact,
                location, workflow, workflow_step_order, status, created_at, completed_at,
                name, valuation_type, red_flag, remarks, assigned_to, assigned_to_role,
                assigned_to_phone_number, assigned_to_email, assigned_to_whatsapp,
                created_by, completed_by
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22
            )
            ON CONFLICT (partition_key, valuation_id) DO UPDATE SET
                vehicle_number = EXCLUDED.vehicle_number,
                applicant_name = EXCLUDED.applicant_name,
                applicant_contact = EXCLUDED.applicant_contact,
                location = EXCLUDED.location,
                workflow = EXCLUDED.workflow,
                workflow_step_order = EXCLUDED.workflow_step_order,
                status = EXCLUDED.status,
                completed_at = EXCLUDED.completed_at,
                name = EXCLUDED.name,
                valuation_type = EXCLUDED.valuation_type,
                red_flag = EXCLUDED.red_flag,
                remarks = EXCLUDED.remarks,
                -- unset assignment columns keep the stored value
                assigned_to = COALESCE(EXCLUDED.assigned_to, workflow_mirror.assigned_to),
                assigned_to_role =
                    COALESCE(EXCLUDED.assigned_to_role, workflow_mirror.assigned_to_role),
                assigned_to_phone_number = COALESCE(
                    EXCLUDED.assigned_to_phone_number,
                    workflow_mirror.assigned_to_phone_number
                ),
                assigned_to_email =
                    COALESCE(EXCLUDED.assigned_to_email, workflow_mirror.assigned_to_email),
                assigned_to_whatsapp =
                    COALESCE(EXCLUDED.assigned_to_whatsapp, workflow_mirror.assigned_to_whatsapp),
                created_by = COALESCE(EXCLUDED.created_by, workflow_mirror.created_by),
                completed_by = COALESCE(EXCLUDED.completed_by, workflow_mirror.completed_by)
            -- created_at keeps the value of the first insert
            "#,
        )
        .bind(&record.valuation_id)
        .bind(&record.partition_key)
        .bind(&record.vehicle_number)
        .bind(&record.applicant_name)
        .bind(&record.applicant_contact)
        .bind(&record.location)
        .bind(&record.workflow)
        .bind(record.workflow_step_order as i32)
        .bind(record.status.to_string())
        .bind(record.created_at)
        .bind(record.completed_at)
        .bind(&record.name)
        .bind(&record.valuation_type)
        .bind(record.red_flag)
        .bind(&record.remarks)
        .bind(&record.assignment.assigned_to)
        .bind(&record.assignment.assigned_to_role)
        .bind(&record.assignment.assigned_to_phone_number)
        .bind(&record.assignment.assigned_to_email)
        .bind(&record.assignment.assigned_to_whatsapp)
        .bind(&record.assignment.created_by)
        .bind(&record.assignment.completed_by)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            RepositoryError::Database(format!("Failed to upsert workflow mirror: {}", e))
        })?;

        Ok(())
    }

    async fn get(
        &self,
        partition_key: &str,
        valuation_id: &str,
    ) -> Result<Option<WorkflowMirrorRecord>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM workflow_mirror WHERE partition_key = $1 AND valuation_id = $2",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(partition_key)
            .bind(valuation_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(parse_mirror_row).transpose()
    }

    async fn delete(&self, partition_key: &str, valuation_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM workflow_mirror WHERE partition_key = $1 AND valuation_id = $2")
            .bind(partition_key)
            .bind(valuation_id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_in_progress(&self) -> Result<Vec<WorkflowMirrorRecord>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM workflow_mirror WHERE status = 'InProgress' ORDER BY created_at ASC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(parse_mirror_row).collect()
    }
}
