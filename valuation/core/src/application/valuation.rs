// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! AI price estimation for a case

use std::sync::Arc;
use tracing::{info, warn};

use crate::application::case_store::CaseStore;
use crate::application::error::{ServiceError, ServiceResult};
use crate::domain::case::CaseKey;
use crate::domain::estimator::{parse_price_bands, ValuationEstimator, VehicleFacts};
use crate::domain::sections::ValuationResponse;

#[derive(Clone)]
pub struct ValuationService {
    store: CaseStore,
    estimator: Option<Arc<dyn ValuationEstimator>>,
}

impl ValuationService {
    pub fn new(store: CaseStore, estimator: Option<Arc<dyn ValuationEstimator>>) -> Self {
        Self { store, estimator }
    }

    /// Ask the estimator for a price band and store it as the case's
    /// valuation response.
    pub async fn estimate(&self, key: &CaseKey) -> ServiceResult<ValuationResponse> {
        let estimator = self.estimator.as_ref().ok_or_else(|| {
            ServiceError::UpstreamUnavailable("AI valuation is not configured".to_string())
        })?;

        let mut case = self.store.require(key).await?;
        let facts = VehicleFacts::from_case(&case);

        let raw = estimator.estimate(&facts).await.map_err(|e| {
            warn!(valuation_id = %key.valuation_id, error = %e, "Valuation estimate failed");
            ServiceError::from(e)
        })?;

        let response = parse_price_bands(&raw);
        case.valuation_response = Some(response.clone());
        self.store.save(&mut case).await?;

        metrics::counter!("valuation_section_writes_total", "section" => "valuationresponse.ai")
            .increment(1);
        info!(
            valuation_id = %key.valuation_id,
            low = %response.low_range,
            mid = %response.mid_range,
            high = %response.high_range,
            "Valuation estimate stored"
        );
        Ok(response)
    }
}
