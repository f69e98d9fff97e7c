// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Workflow Use Cases
//!
//! Application service for moving a case through its approval steps.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Load the case, apply one workflow transition, save
//! - **Collaborators:**
//!   - Domain: ValuationCase aggregate, Workflow state machine
//!   - Infrastructure: CaseRepository, WorkflowMirrorRepository

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::application::case_store::CaseStore;
use crate::application::error::ServiceResult;
use crate::application::mirror::WorkflowMirrorService;
use crate::domain::case::{CaseKey, CaseStatus, OpenValuation, ValuationCase};
use crate::domain::workflow::{Workflow, WorkflowError, WorkflowStep};

/// Step annotation request
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepAnnotation {
    pub red_flag: Option<bool>,
    pub remarks: Option<String>,
}

#[async_trait]
pub trait WorkflowService: Send + Sync {
    /// Steps in order; an existing case without a workflow yields an empty list
    ///
    /// # Errors
    ///
    /// - NotFound: the case does not exist
    async fn get_workflow(&self, key: &CaseKey) -> ServiceResult<Vec<WorkflowStep>>;

    /// # Errors
    ///
    /// - NotFound: case or step does not exist
    /// - SequenceViolation: the previous step is not completed
    /// - InvalidTransition: the step is already completed
    async fn start_step(&self, key: &CaseKey, step_order: u32) -> ServiceResult<WorkflowStep>;

    /// # Errors
    ///
    /// - NotFound: case or step does not exist
    /// - InvalidTransition: the step is not in progress
    async fn complete_step(&self, key: &CaseKey, step_order: u32) -> ServiceResult<WorkflowStep>;

    async fn annotate_step(
        &self,
        key: &CaseKey,
        step_order: u32,
        annotation: StepAnnotation,
    ) -> ServiceResult<WorkflowStep>;

    /// Clear the step list and keep the case
    async fn delete_workflow(&self, key: &CaseKey) -> ServiceResult<()>;

    /// Open cases with their in-progress steps, oldest first
    async fn list_open_cases(&self) -> ServiceResult<Vec<OpenValuation>>;
}

/// Standard implementation of WorkflowService
pub struct StandardWorkflowService {
    store: CaseStore,
    mirror: WorkflowMirrorService,
}

impl StandardWorkflowService {
    pub fn new(store: CaseStore, mirror: WorkflowMirrorService) -> Self {
        Self { store, mirror }
    }

    /// Load, apply one change to the workflow, save, and return the step.
    async fn transition<F>(
        &self,
        key: &CaseKey,
        step_order: u32,
        label: &'static str,
        apply: F,
    ) -> ServiceResult<WorkflowStep>
    where
        F: FnOnce(&mut ValuationCase) -> Result<WorkflowStep, WorkflowError> + Send,
    {
        let mut case = self.store.require(key).await?;
        let step = apply(&mut case)?;
        case.refresh_completion(Utc::now());
        self.store.save(&mut case).await?;

        metrics::counter!("valuation_step_transitions_total", "transition" => label)
            .increment(1);
        info!(
            valuation_id = %key.valuation_id,
            step_order,
            role = %step.assigned_to_role,
            status = %step.status,
            case_status = %case.status,
            "Workflow step {}", label
        );
        self.mirror.publish(&case);
        Ok(step)
    }
}

fn workflow_mut(case: &mut ValuationCase, step_order: u32) -> Result<&mut Workflow, WorkflowError> {
    case.workflow.as_mut().ok_or(WorkflowError::StepNotFound(step_order))
}

#[async_trait]
impl WorkflowService for StandardWorkflowService {
    async fn get_workflow(&self, key: &CaseKey) -> ServiceResult<Vec<WorkflowStep>> {
        let case = self.store.require(key).await?;
        Ok(case.workflow_steps())
    }

    async fn start_step(&self, key: &CaseKey, step_order: u32) -> ServiceResult<WorkflowStep> {
        self.transition(key, step_order, "started", |case| {
            let now = Utc::now();
            workflow_mut(case, step_order)?
                .start_step(step_order, now)
                .cloned()
        })
        .await
    }

    async fn complete_step(&self, key: &CaseKey, step_order: u32) -> ServiceResult<WorkflowStep> {
        self.transition(key, step_order, "completed", |case| {
            let now = Utc::now();
            workflow_mut(case, step_order)?
                .complete_step(step_order, now)
                .cloned()
        })
        .await
    }

    async fn annotate_step(
        &self,
        key: &CaseKey,
        step_order: u32,
        annotation: StepAnnotation,
    ) -> ServiceResult<WorkflowStep> {
        self.transition(key, step_order, "annotated", move |case| {
            workflow_mut(case, step_order)?
                .annotate_step(step_order, annotation.red_flag, annotation.remarks)
                .cloned()
        })
        .await
    }

    async fn delete_workflow(&self, key: &CaseKey) -> ServiceResult<()> {
        let mut case = self.store.require(key).await?;
        case.workflow = None;
        self.store.save(&mut case).await?;
        info!(valuation_id = %key.valuation_id, "Workflow cleared");
        Ok(())
    }

    async fn list_open_cases(&self) -> ServiceResult<Vec<OpenValuation>> {
        let cases = self.store.repository().find_by_status(CaseStatus::Open).await?;
        let mut open: Vec<OpenValuation> = cases
            .iter()
            .filter_map(ValuationCase::to_open_valuation)
            .collect();
        open.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.valuation_id.cmp(&b.valuation_id))
        });
        Ok(open)
    }
}
