// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Service container
//!
//! Wires repositories and external adapters into the application services
//! handed to the HTTP layer.

use std::sync::Arc;

use crate::application::case_store::CaseStore;
use crate::application::mirror::WorkflowMirrorService;
use crate::application::photos::PhotoService;
use crate::application::repository_factory::{create_repositories, Repositories};
use crate::application::sections::SectionService;
use crate::application::stakeholder::StakeholderService;
use crate::application::valuation::ValuationService;
use crate::application::vehicle_details::VehicleDetailsService;
use crate::application::workflow_service::{StandardWorkflowService, WorkflowService};
use crate::domain::config::ServiceConfig;
use crate::domain::estimator::ValuationEstimator;
use crate::domain::rc::RcLookup;
use crate::domain::storage::BlobStore;
use crate::infrastructure::llm::openai::OpenAiValuationEstimator;
use crate::infrastructure::rc_client::HttpRcLookup;
use crate::infrastructure::storage::create_blob_store;

#[derive(Clone)]
pub struct ValuationServices {
    pub cases: CaseStore,
    pub sections: SectionService,
    pub stakeholder: StakeholderService,
    pub vehicle_details: VehicleDetailsService,
    pub photos: PhotoService,
    pub valuation: ValuationService,
    pub workflow: Arc<dyn WorkflowService>,
    pub mirror: WorkflowMirrorService,
}

impl ValuationServices {
    pub fn new(
        repositories: Repositories,
        blobs: Arc<dyn BlobStore>,
        rc_lookup: Option<Arc<dyn RcLookup>>,
        estimator: Option<Arc<dyn ValuationEstimator>>,
    ) -> Self {
        let cases = CaseStore::new(repositories.cases);
        let mirror = WorkflowMirrorService::new(repositories.mirror);
        let sections = SectionService::new(cases.clone(), blobs);

        Self {
            stakeholder: StakeholderService::new(sections.clone(), mirror.clone()),
            vehicle_details: VehicleDetailsService::new(cases.clone(), rc_lookup),
            photos: PhotoService::new(sections.clone()),
            valuation: ValuationService::new(cases.clone(), estimator),
            workflow: Arc::new(StandardWorkflowService::new(cases.clone(), mirror.clone())),
            sections,
            mirror,
            cases,
        }
    }

    /// Build every service from configuration
    pub async fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        let repositories = create_repositories(&config.storage_backend()?).await?;
        let blobs = create_blob_store(&config.blob)?;

        let rc_lookup = match &config.rc_lookup {
            Some(rc) => Some(Arc::new(HttpRcLookup::from_config(rc)?) as Arc<dyn RcLookup>),
            None => {
                tracing::warn!("rc_lookup not configured; with-rc requests will fail");
                None
            }
        };

        let estimator = match &config.valuation_ai {
            Some(ai) => {
                let estimator = OpenAiValuationEstimator::from_config(ai)?;
                Some(Arc::new(estimator) as Arc<dyn ValuationEstimator>)
            }
            None => {
                tracing::warn!("valuation_ai not configured; estimates will fail");
                None
            }
        };

        Ok(Self::new(repositories, blobs, rc_lookup, estimator))
    }
}
