// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Vehicle details enrichment from the RC registry

use std::sync::Arc;
use tracing::{info, warn};

use crate::application::case_store::CaseStore;
use crate::application::error::{ServiceError, ServiceResult};
use crate::domain::case::CaseKey;
use crate::domain::rc::RcLookup;
use crate::domain::sections::VehicleDetails;

#[derive(Clone)]
pub struct VehicleDetailsService {
    store: CaseStore,
    rc_lookup: Option<Arc<dyn RcLookup>>,
}

impl VehicleDetailsService {
    pub fn new(store: CaseStore, rc_lookup: Option<Arc<dyn RcLookup>>) -> Self {
        Self { store, rc_lookup }
    }

    /// Refresh the stored vehicle details from the RC registry.
    ///
    /// The case must exist. A failed lookup saves nothing. Fields the registry
    /// does not return keep their local values.
    pub async fn with_rc_check(&self, key: &CaseKey) -> ServiceResult<VehicleDetails> {
        let rc_lookup = self.rc_lookup.as_ref().ok_or_else(|| {
            ServiceError::UpstreamUnavailable("RC lookup is not configured".to_string())
        })?;

        let mut case = self.store.require(key).await?;
        let local = case.vehicle_details.clone().unwrap_or_default();
        let registration = local
            .registration_number
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| case.vehicle_number.clone());

        let record = rc_lookup.lookup(&registration).await.map_err(|e| {
            warn!(
                valuation_id = %key.valuation_id,
                registration = %registration,
                error = %e,
                "RC lookup failed"
            );
            ServiceError::from(e)
        })?;

        let merged = local.merged_with(&record);
        case.vehicle_details = Some(merged.clone());
        self.store.save(&mut case).await?;

        metrics::counter!("valuation_section_writes_total", "section" => "vehicledetails.rc")
            .increment(1);
        info!(
            valuation_id = %key.valuation_id,
            registration = %registration,
            "Vehicle details refreshed from RC"
        );
        Ok(merged)
    }
}
