// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod error;
pub mod case_store;
pub mod sections;
pub mod mirror;
pub mod stakeholder;
pub mod vehicle_details;
pub mod photos;
pub mod valuation;
pub mod workflow_service;
pub mod repository_factory;
pub mod container;

// Re-export services for convenience
pub use error::{ServiceError, ServiceResult};
pub use case_store::CaseStore;
pub use sections::SectionService;
pub use workflow_service::{StandardWorkflowService, StepAnnotation, WorkflowService};
pub use container::ValuationServices;
