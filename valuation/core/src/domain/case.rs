// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Valuation Case Aggregate
//!
//! One [`ValuationCase`] document per valuation. The aggregate is the unit of
//! storage: every section write reads the whole document, replaces one field
//! and writes the whole document back under the same partition key.
//!
//! The partition key is `"{vehicle_number}|{applicant_contact}"` and comes
//! from the request's [`CaseKey`], never from section payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::sections::{
    InspectionDetails, PhotoUrls, QualityControl, Stakeholder, ValuationResponse, VehicleDetails,
};
use crate::domain::workflow::{Workflow, WorkflowStep};

/// Composite identity of a case as supplied by every request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseKey {
    pub valuation_id: String,
    pub vehicle_number: String,
    pub applicant_contact: String,
}

impl CaseKey {
    pub fn new(
        valuation_id: impl Into<String>,
        vehicle_number: impl Into<String>,
        applicant_contact: impl Into<String>,
    ) -> Self {
        Self {
            valuation_id: valuation_id.into(),
            vehicle_number: vehicle_number.into(),
            applicant_contact: applicant_contact.into(),
        }
    }

    /// Build a key, rejecting blank parts and parts that would make the
    /// partition key ambiguous.
    pub fn parse(
        valuation_id: &str,
        vehicle_number: &str,
        applicant_contact: &str,
    ) -> Result<Self, CaseKeyError> {
        let check = |field: &'static str, value: &str| -> Result<String, CaseKeyError> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(CaseKeyError::Empty(field));
            }
            if trimmed.contains('|') {
                return Err(CaseKeyError::Separator(field));
            }
            Ok(trimmed.to_string())
        };

        Ok(Self {
            valuation_id: check("valuationId", valuation_id)?,
            vehicle_number: check("vehicleNumber", vehicle_number)?,
            applicant_contact: check("applicantContact", applicant_contact)?,
        })
    }

    pub fn partition_key(&self) -> String {
        format!("{}|{}", self.vehicle_number, self.applicant_contact)
    }
}

impl std::fmt::Display for CaseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.valuation_id, self.partition_key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseKeyError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} must not contain '|'")]
    Separator(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CaseStatus {
    #[default]
    Open,
    Completed,
    Deleted,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "Open",
            CaseStatus::Completed => "Completed",
            CaseStatus::Deleted => "Deleted",
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate root for one vehicle valuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationCase {
    pub id: String,
    pub partition_key: String,
    pub vehicle_number: String,
    pub applicant_contact: String,
    #[serde(default)]
    pub status: CaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    /// Revision of the stored document; `0` until the first save
    #[serde(default)]
    pub version: u64,

    #[serde(default)]
    pub stakeholder: Option<Stakeholder>,
    #[serde(default)]
    pub vehicle_details: Option<VehicleDetails>,
    #[serde(default)]
    pub inspection_details: Option<InspectionDetails>,
    #[serde(default)]
    pub quality_control: Option<QualityControl>,
    #[serde(default)]
    pub valuation_response: Option<ValuationResponse>,
    #[serde(default)]
    pub photo_urls: Option<PhotoUrls>,
    #[serde(default)]
    pub workflow: Option<Workflow>,
}

impl ValuationCase {
    /// Materialize an empty open case with the standard workflow.
    pub fn new(key: &CaseKey, now: DateTime<Utc>) -> Self {
        Self {
            id: key.valuation_id.clone(),
            partition_key: key.partition_key(),
            vehicle_number: key.vehicle_number.clone(),
            applicant_contact: key.applicant_contact.clone(),
            status: CaseStatus::Open,
            created_at: now,
            updated_at: now,
            completed_at: None,
            deleted_at: None,
            version: 0,
            stakeholder: None,
            vehicle_details: None,
            inspection_details: None,
            quality_control: None,
            valuation_response: None,
            photo_urls: None,
            workflow: Some(Workflow::standard()),
        }
    }

    pub fn key(&self) -> CaseKey {
        CaseKey::new(&self.id, &self.vehicle_number, &self.applicant_contact)
    }

    pub fn is_new(&self) -> bool {
        self.version == 0
    }

    /// Install the standard workflow if none is present. Returns `true` when
    /// a workflow was created.
    pub fn ensure_workflow(&mut self) -> bool {
        if self.workflow.is_some() {
            return false;
        }
        self.workflow = Some(Workflow::standard());
        true
    }

    pub fn workflow_steps(&self) -> Vec<WorkflowStep> {
        self.workflow
            .as_ref()
            .map(|wf| wf.steps().to_vec())
            .unwrap_or_default()
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Called after a workflow transition; closes the case once every step
    /// has completed.
    pub fn refresh_completion(&mut self, now: DateTime<Utc>) {
        let complete = self.workflow.as_ref().map(Workflow::is_complete).unwrap_or(false);
        if complete && self.status == CaseStatus::Open {
            self.status = CaseStatus::Completed;
            self.completed_at = Some(now);
        }
    }

    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.status = CaseStatus::Deleted;
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    /// Derived open-case projection, `None` unless the case is open.
    pub fn to_open_valuation(&self) -> Option<OpenValuation> {
        if self.status != CaseStatus::Open {
            return None;
        }
        let in_progress_steps = self
            .workflow
            .as_ref()
            .map(Workflow::in_progress)
            .unwrap_or_default();

        Some(OpenValuation {
            valuation_id: self.id.clone(),
            vehicle_number: self.vehicle_number.clone(),
            applicant_name: self
                .stakeholder
                .as_ref()
                .map(|s| s.applicant.name.clone())
                .unwrap_or_default(),
            applicant_contact: self.applicant_contact.clone(),
            created_at: self.created_at,
            in_progress_steps,
        })
    }
}

/// Read-only view of an open case and its current steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenValuation {
    pub valuation_id: String,
    pub vehicle_number: String,
    pub applicant_name: String,
    pub applicant_contact: String,
    pub created_at: DateTime<Utc>,
    pub in_progress_steps: Vec<WorkflowStep>,
}
