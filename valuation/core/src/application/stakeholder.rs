// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Stakeholder intake
//!
//! The stakeholder write is the usual section upsert plus two side effects:
//! the workflow is reinstalled if it was cleared, and the case position is
//! published to the workflow mirror.

use crate::application::error::ServiceResult;
use crate::application::mirror::WorkflowMirrorService;
use crate::application::sections::SectionService;
use crate::domain::case::CaseKey;
use crate::domain::sections::Stakeholder;
use crate::domain::storage::FileUpload;

#[derive(Clone)]
pub struct StakeholderService {
    sections: SectionService,
    mirror: WorkflowMirrorService,
}

impl StakeholderService {
    pub fn new(sections: SectionService, mirror: WorkflowMirrorService) -> Self {
        Self { sections, mirror }
    }

    pub async fn get(&self, key: &CaseKey) -> ServiceResult<Stakeholder> {
        self.sections.get::<Stakeholder>(key).await
    }

    pub async fn upsert(
        &self,
        key: &CaseKey,
        payload: Stakeholder,
        files: Vec<FileUpload>,
    ) -> ServiceResult<Stakeholder> {
        let (stakeholder, case) = self
            .sections
            .upsert_with(key, payload, files, |case| {
                if case.ensure_workflow() {
                    tracing::info!(
                        valuation_id = %case.id,
                        "Workflow reinitialized by stakeholder update"
                    );
                }
            })
            .await?;

        self.mirror.publish(&case);
        Ok(stakeholder)
    }

    pub async fn delete(&self, key: &CaseKey) -> ServiceResult<()> {
        self.sections.delete::<Stakeholder>(key).await
    }
}
