// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application service errors
//!
//! Every domain error is folded into [`ServiceError`]; the presentation layer
//! maps each kind to one HTTP status.

use thiserror::Error;

use crate::domain::case::{CaseKey, CaseKeyError};
use crate::domain::estimator::EstimatorError;
use crate::domain::rc::LookupError;
use crate::domain::repository::RepositoryError;
use crate::domain::storage::StorageError;
use crate::domain::workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    SequenceViolation(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Upload failed: {0}")]
    UploadFailure(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl ServiceError {
    pub fn case_not_found(key: &CaseKey) -> Self {
        ServiceError::NotFound(format!("Valuation {} not found", key.valuation_id))
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::SequenceViolation(_) => "sequence_violation",
            ServiceError::InvalidTransition(_) => "invalid_transition",
            ServiceError::UploadFailure(_) => "upload_failure",
            ServiceError::UpstreamUnavailable(_) => "upstream_unavailable",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Validation(_) => "validation",
            ServiceError::Repository(_) => "repository",
        }
    }
}

impl From<WorkflowError> for ServiceError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::StepNotFound(_) => ServiceError::NotFound(err.to_string()),
            WorkflowError::SequenceViolation { .. } => {
                ServiceError::SequenceViolation(err.to_string())
            }
            WorkflowError::InvalidTransition { .. } => {
                ServiceError::InvalidTransition(err.to_string())
            }
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ServiceError::NotFound(msg),
            RepositoryError::Conflict { .. } => ServiceError::Conflict(err.to_string()),
            other => ServiceError::Repository(other.to_string()),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::UploadFailure(err.to_string())
    }
}

impl From<LookupError> for ServiceError {
    fn from(err: LookupError) -> Self {
        ServiceError::UpstreamUnavailable(err.to_string())
    }
}

impl From<EstimatorError> for ServiceError {
    fn from(err: EstimatorError) -> Self {
        ServiceError::UpstreamUnavailable(err.to_string())
    }
}

impl From<CaseKeyError> for ServiceError {
    fn from(err: CaseKeyError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::StepStatus;

    #[test]
    fn test_workflow_errors_map_to_kinds() {
        let e: ServiceError = WorkflowError::StepNotFound(7).into();
        assert!(matches!(e, ServiceError::NotFound(_)));

        let e: ServiceError = WorkflowError::SequenceViolation {
            step_order: 3,
            previous: 2,
        }
        .into();
        assert_eq!(e.to_string(), "Cannot start step 3 before completing step 2");

        let e: ServiceError = WorkflowError::InvalidTransition {
            step_order: 1,
            from: StepStatus::Pending,
            to: StepStatus::Completed,
        }
        .into();
        assert_eq!(e.kind(), "invalid_transition");
    }

    #[test]
    fn test_repository_conflict_maps_to_conflict() {
        let e: ServiceError = RepositoryError::Conflict {
            id: "v1".into(),
            expected: 2,
            actual: Some(3),
        }
        .into();
        assert!(matches!(e, ServiceError::Conflict(_)));
        let e: ServiceError = RepositoryError::Database("down".into()).into();
        assert!(matches!(e, ServiceError::Repository(_)));
    }
}
