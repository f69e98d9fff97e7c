// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Workflow Domain Model
//!
//! Every valuation case carries the same fixed approval pipeline of five
//! steps. Each step is a tiny state machine:
//!
//! ```text
//! Pending ──start──▶ InProgress ──complete──▶ Completed
//! ```
//!
//! # Invariants
//!
//! - Step `n > 1` can only be started once step `n - 1` is `Completed`.
//! - Only an `InProgress` step can be completed.
//! - `Completed` is terminal; there are no regressions.
//! - Steps are created once from [`STANDARD_TEMPLATE`] and never added or
//!   removed individually.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Value Objects
// ============================================================================

/// Lifecycle state of a single workflow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Pending => "Pending",
            StepStatus::InProgress => "InProgress",
            StepStatus::Completed => "Completed",
        };
        f.write_str(s)
    }
}

/// Role responsible for a workflow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepRole {
    Stakeholder,
    BackEnd,
    #[serde(rename = "AVO")]
    Avo,
    #[serde(rename = "QC")]
    Qc,
    FinalReport,
}

impl StepRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepRole::Stakeholder => "Stakeholder",
            StepRole::BackEnd => "BackEnd",
            StepRole::Avo => "AVO",
            StepRole::Qc => "QC",
            StepRole::FinalReport => "FinalReport",
        }
    }
}

impl std::fmt::Display for StepRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical pipeline: `(template step id, assigned role)` in step order.
pub const STANDARD_TEMPLATE: [(u32, StepRole); 5] = [
    (1, StepRole::Stakeholder),
    (2, StepRole::BackEnd),
    (3, StepRole::Avo),
    (4, StepRole::Qc),
    (5, StepRole::FinalReport),
];

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    /// 1-based position, unique within a case
    pub step_order: u32,
    pub template_step_id: u32,
    pub assigned_to_role: StepRole,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl WorkflowStep {
    fn pending(step_order: u32, template_step_id: u32, role: StepRole) -> Self {
        Self {
            step_order,
            template_step_id,
            assigned_to_role: role,
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            red_flag: None,
            remarks: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == StepStatus::InProgress
    }
}

/// Ordered list of workflow steps owned by a case
///
/// Serialized as a plain list. Deserialization always goes through
/// [`Workflow::from_steps`], so steps read back in ascending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<WorkflowStep>", into = "Vec<WorkflowStep>")]
pub struct Workflow {
    steps: Vec<WorkflowStep>,
}

impl Workflow {
    /// Build the five-step pipeline with step 1 already in progress.
    pub fn standard() -> Self {
        let steps = STANDARD_TEMPLATE
            .iter()
            .enumerate()
            .map(|(idx, (template_id, role))| {
                let mut step = WorkflowStep::pending(idx as u32 + 1, *template_id, *role);
                if idx == 0 {
                    step.status = StepStatus::InProgress;
                }
                step
            })
            .collect();
        Self { steps }
    }

    /// Rebuild from stored steps, normalising to ascending step order.
    pub fn from_steps(mut steps: Vec<WorkflowStep>) -> Self {
        steps.sort_by_key(|s| s.step_order);
        Self { steps }
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<WorkflowStep> {
        self.steps
    }

    pub fn step(&self, step_order: u32) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.step_order == step_order)
    }

    fn step_mut(&mut self, step_order: u32) -> Result<&mut WorkflowStep, WorkflowError> {
        self.steps
            .iter_mut()
            .find(|s| s.step_order == step_order)
            .ok_or(WorkflowError::StepNotFound(step_order))
    }

    /// Steps currently in progress, in step order
    pub fn in_progress(&self) -> Vec<WorkflowStep> {
        self.steps.iter().filter(|s| s.is_in_progress()).cloned().collect()
    }

    /// The lowest-ordered step that is not yet completed
    pub fn current(&self) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.status != StepStatus::Completed)
    }

    /// True once every step has been completed
    pub fn is_complete(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.status == StepStatus::Completed)
    }

    /// Move a step to `InProgress`.
    ///
    /// Restarting a step that is already in progress is accepted and keeps
    /// its original `started_at`.
    pub fn start_step(
        &mut self,
        step_order: u32,
        now: DateTime<Utc>,
    ) -> Result<&WorkflowStep, WorkflowError> {
        if self.step(step_order).is_none() {
            return Err(WorkflowError::StepNotFound(step_order));
        }

        if step_order > 1 {
            let previous_done = self
                .step(step_order - 1)
                .map(|s| s.status == StepStatus::Completed)
                .unwrap_or(false);
            if !previous_done {
                return Err(WorkflowError::SequenceViolation {
                    step_order,
                    previous: step_order - 1,
                });
            }
        }

        let step = self.step_mut(step_order)?;
        match step.status {
            StepStatus::Completed => {
                return Err(WorkflowError::InvalidTransition {
                    step_order,
                    from: StepStatus::Completed,
                    to: StepStatus::InProgress,
                });
            }
            StepStatus::InProgress => {
                step.started_at.get_or_insert(now);
            }
            StepStatus::Pending => {
                step.status = StepStatus::InProgress;
                step.started_at = Some(now);
            }
        }
        Ok(step)
    }

    /// Move an `InProgress` step to `Completed`.
    pub fn complete_step(
        &mut self,
        step_order: u32,
        now: DateTime<Utc>,
    ) -> Result<&WorkflowStep, WorkflowError> {
        let step = self.step_mut(step_order)?;
        if step.status != StepStatus::InProgress {
            return Err(WorkflowError::InvalidTransition {
                step_order,
                from: step.status,
                to: StepStatus::Completed,
            });
        }
        step.status = StepStatus::Completed;
        step.completed_at = Some(now);
        Ok(step)
    }

    /// Replace the step-scoped annotations.
    pub fn annotate_step(
        &mut self,
        step_order: u32,
        red_flag: Option<bool>,
        remarks: Option<String>,
    ) -> Result<&WorkflowStep, WorkflowError> {
        let step = self.step_mut(step_order)?;
        step.red_flag = red_flag;
        step.remarks = remarks;
        Ok(step)
    }
}

impl From<Vec<WorkflowStep>> for Workflow {
    fn from(steps: Vec<WorkflowStep>) -> Self {
        Self::from_steps(steps)
    }
}

impl From<Workflow> for Vec<WorkflowStep> {
    fn from(workflow: Workflow) -> Self {
        workflow.into_steps()
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Workflow step {0} not defined")]
    StepNotFound(u32),

    #[error("Cannot start step {step_order} before completing step {previous}")]
    SequenceViolation { step_order: u32, previous: u32 },

    #[error("Step {step_order} cannot move from {from} to {to}")]
    InvalidTransition {
        step_order: u32,
        from: StepStatus,
        to: StepStatus,
    },
}
