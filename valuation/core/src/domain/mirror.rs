// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Workflow mirror record
//!
//! A flat, denormalized row describing where one case currently sits in its
//! workflow. The mirror is a reporting projection; the case document stays
//! authoritative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::case::ValuationCase;
use crate::domain::workflow::{StepStatus, WorkflowStep};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMirrorRecord {
    pub valuation_id: String,
    pub partition_key: String,
    pub vehicle_number: String,
    #[serde(default)]
    pub applicant_name: String,
    pub applicant_contact: String,
    #[serde(default)]
    pub location: String,
    /// Role name of the current step, e.g. `Stakeholder`
    pub workflow: String,
    pub workflow_step_order: u32,
    pub status: StepStatus,
    /// Preserved from the first write of this row
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub valuation_type: Option<String>,
    #[serde(default)]
    pub red_flag: Option<bool>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(flatten)]
    pub assignment: Assignment,
}

/// Who the current step is assigned to and who touched the row.
///
/// Case updates do not carry these, so an upsert with a column unset keeps
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub assigned_to_role: Option<String>,
    #[serde(default)]
    pub assigned_to_phone_number: Option<String>,
    #[serde(default)]
    pub assigned_to_email: Option<String>,
    #[serde(default)]
    pub assigned_to_whatsapp: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub completed_by: Option<String>,
}

impl Assignment {
    /// Fill every unset column from `stored`.
    pub fn keep_unset_from(&mut self, stored: &Assignment) {
        fn keep(slot: &mut Option<String>, stored: &Option<String>) {
            if slot.is_none() {
                slot.clone_from(stored);
            }
        }
        keep(&mut self.assigned_to, &stored.assigned_to);
        keep(&mut self.assigned_to_role, &stored.assigned_to_role);
        keep(&mut self.assigned_to_phone_number, &stored.assigned_to_phone_number);
        keep(&mut self.assigned_to_email, &stored.assigned_to_email);
        keep(&mut self.assigned_to_whatsapp, &stored.assigned_to_whatsapp);
        keep(&mut self.created_by, &stored.created_by);
        keep(&mut self.completed_by, &stored.completed_by);
    }
}

impl WorkflowMirrorRecord {
    /// Project `case` at `step`.
    pub fn project(case: &ValuationCase, step: &WorkflowStep) -> Self {
        let stakeholder = case.stakeholder.as_ref();
        Self {
            valuation_id: case.id.clone(),
            partition_key: case.partition_key.clone(),
            vehicle_number: case.vehicle_number.clone(),
            applicant_name: stakeholder
                .map(|s| s.applicant.name.clone())
                .unwrap_or_default(),
            applicant_contact: case.applicant_contact.clone(),
            location: stakeholder
                .map(|s| s.vehicle_location.name.clone())
                .unwrap_or_default(),
            workflow: step.assigned_to_role.to_string(),
            workflow_step_order: step.step_order,
            status: step.status,
            created_at: case.created_at,
            completed_at: step.completed_at,
            name: stakeholder.map(|s| s.name.clone()).unwrap_or_default(),
            valuation_type: stakeholder.and_then(|s| s.valuation_type.clone()),
            red_flag: step.red_flag,
            remarks: step.remarks.clone(),
            assignment: Assignment {
                assigned_to_role: Some(step.assigned_to_role.to_string()),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::case::CaseKey;
    use crate::domain::sections::Stakeholder;

    #[test]
    fn test_project_first_step() {
        let mut case = ValuationCase::new(&CaseKey::new("v1", "KA01", "99"), Utc::now());
        case.stakeholder = Some(Stakeholder {
            name: "Acme Finance".into(),
            valuation_type: Some("Retail".into()),
            ..Default::default()
        });
        let step = case.workflow_steps()[0].clone();
        let row = WorkflowMirrorRecord::project(&case, &step);

        assert_eq!(row.workflow, "Stakeholder");
        assert_eq!(row.workflow_step_order, 1);
        assert_eq!(row.status, StepStatus::InProgress);
        assert_eq!(row.name, "Acme Finance");
        assert_eq!(row.partition_key, "KA01|99");
        assert_eq!(row.assignment.assigned_to_role.as_deref(), Some("Stakeholder"));
        assert!(row.assignment.assigned_to.is_none());
    }

    #[test]
    fn test_unset_assignment_columns_keep_stored_values() {
        let stored = Assignment {
            assigned_to: Some("Priya".into()),
            assigned_to_role: Some("Stakeholder".into()),
            assigned_to_email: Some("priya@acme.example".into()),
            created_by: Some("ops".into()),
            ..Default::default()
        };
        let mut incoming = Assignment {
            assigned_to_role: Some("BackEnd".into()),
            completed_by: Some("Priya".into()),
            ..Default::default()
        };
        incoming.keep_unset_from(&stored);

        assert_eq!(incoming.assigned_to.as_deref(), Some("Priya"));
        assert_eq!(incoming.assigned_to_role.as_deref(), Some("BackEnd"));
        assert_eq!(incoming.assigned_to_email.as_deref(), Some("priya@acme.example"));
        assert_eq!(incoming.created_by.as_deref(), Some("ops"));
        assert_eq!(incoming.completed_by.as_deref(), Some("Priya"));
        assert!(incoming.assigned_to_whatsapp.is_none());
    }

    #[test]
    fn test_assignment_columns_are_flat_on_the_wire() {
        let mut case = ValuationCase::new(&CaseKey::new("v1", "KA01", "99"), Utc::now());
        case.stakeholder = Some(Stakeholder::default());
        let mut row = WorkflowMirrorRecord::project(&case, &case.workflow_steps()[0].clone());
        row.assignment.assigned_to_phone_number = Some("9000000001".into());

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["assignedToPhoneNumber"], "9000000001");
        assert_eq!(json["assignedToRole"], "Stakeholder");

        let back: WorkflowMirrorRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }
}
