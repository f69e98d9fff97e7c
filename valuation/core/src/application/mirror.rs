// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Workflow Mirror Service
//!
//! Maintains the reporting table row for each case. Writes triggered by case
//! updates go through [`WorkflowMirrorService::publish`], which queues the
//! projection for a single background writer. A mirror failure never fails
//! the case write, and projections land in the order they were published.

use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::application::error::ServiceResult;
use crate::domain::case::{CaseKey, ValuationCase};
use crate::domain::mirror::WorkflowMirrorRecord;
use crate::domain::repository::WorkflowMirrorRepository;
use crate::domain::workflow::WorkflowStep;

type MirrorQueue = mpsc::UnboundedSender<WorkflowMirrorRecord>;

#[derive(Clone)]
pub struct WorkflowMirrorService {
    repository: Arc<dyn WorkflowMirrorRepository>,
    /// Started on first publish; shared by every clone of the service
    writer: Arc<OnceLock<MirrorQueue>>,
}

impl WorkflowMirrorService {
    pub fn new(repository: Arc<dyn WorkflowMirrorRepository>) -> Self {
        Self {
            repository,
            writer: Arc::new(OnceLock::new()),
        }
    }

    pub async fn get(&self, key: &CaseKey) -> ServiceResult<Option<WorkflowMirrorRecord>> {
        Ok(self
            .repository
            .get(&key.partition_key(), &key.valuation_id)
            .await?)
    }

    /// Direct table write; identity fields are taken from `key`.
    pub async fn upsert(
        &self,
        key: &CaseKey,
        mut record: WorkflowMirrorRecord,
    ) -> ServiceResult<WorkflowMirrorRecord> {
        record.valuation_id = key.valuation_id.clone();
        record.partition_key = key.partition_key();
        record.vehicle_number = key.vehicle_number.clone();
        record.applicant_contact = key.applicant_contact.clone();
        self.repository.upsert(&record).await?;
        Ok(self
            .repository
            .get(&record.partition_key, &record.valuation_id)
            .await?
            .unwrap_or(record))
    }

    pub async fn delete(&self, key: &CaseKey) -> ServiceResult<()> {
        Ok(self
            .repository
            .delete(&key.partition_key(), &key.valuation_id)
            .await?)
    }

    pub async fn list_in_progress(&self) -> ServiceResult<Vec<WorkflowMirrorRecord>> {
        Ok(self.repository.list_in_progress().await?)
    }

    /// Project `case` and queue it for the background writer.
    ///
    /// Returns `false` when nothing was queued: the case has no workflow, or
    /// the writer has stopped. Must be called from within a Tokio runtime.
    pub fn publish(&self, case: &ValuationCase) -> bool {
        let Some(step) = mirror_position(case) else {
            return false;
        };
        let record = WorkflowMirrorRecord::project(case, &step);
        let queue = self.writer.get_or_init(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(run_writer(Arc::clone(&self.repository), rx));
            tx
        });

        match queue.send(record) {
            Ok(()) => true,
            Err(mpsc::error::SendError(record)) => {
                metrics::counter!("valuation_mirror_failures_total").increment(1);
                warn!(
                    valuation_id = %record.valuation_id,
                    "Workflow mirror writer stopped; projection dropped"
                );
                false
            }
        }
    }
}

/// Drain queued projections one at a time so writes for a case never overtake
/// each other.
async fn run_writer(
    repository: Arc<dyn WorkflowMirrorRepository>,
    mut queue: mpsc::UnboundedReceiver<WorkflowMirrorRecord>,
) {
    while let Some(record) = queue.recv().await {
        match repository.upsert(&record).await {
            Ok(()) => debug!(
                valuation_id = %record.valuation_id,
                step_order = record.workflow_step_order,
                "Workflow mirror updated"
            ),
            Err(e) => {
                metrics::counter!("valuation_mirror_failures_total").increment(1);
                warn!(
                    valuation_id = %record.valuation_id,
                    error = %e,
                    "Workflow mirror update failed"
                );
            }
        }
    }
}

/// The step a case is "at": the first in-progress step, else the first
/// pending step, else the final step.
fn mirror_position(case: &ValuationCase) -> Option<WorkflowStep> {
    let workflow = case.workflow.as_ref()?;
    workflow
        .steps()
        .iter()
        .find(|s| s.is_in_progress())
        .or_else(|| workflow.current())
        .or_else(|| workflow.steps().last())
        .cloned()
}
