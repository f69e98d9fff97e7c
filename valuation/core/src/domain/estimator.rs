// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! AI price estimation port
//!
//! A [`ValuationEstimator`] turns [`VehicleFacts`] into free text containing
//! low, mid and high INR price bands. [`parse_price_bands`] extracts those
//! bands; a band the text does not mention is stored as zero.

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

use crate::domain::case::ValuationCase;
use crate::domain::sections::ValuationResponse;

/// Vehicle attributes handed to the estimator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFacts {
    pub registration_number: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year_of_mfg: Option<i32>,
    pub colour: Option<String>,
    pub fuel: Option<String>,
    pub engine_cc: Option<u32>,
    pub idv: Option<Decimal>,
    pub date_of_registration: Option<NaiveDate>,
    pub city: Option<String>,
    pub odometer: Option<u64>,
}

impl VehicleFacts {
    pub fn from_case(case: &ValuationCase) -> Self {
        let details = case.vehicle_details.clone().unwrap_or_default();
        let city = case
            .stakeholder
            .as_ref()
            .map(|s| s.vehicle_location.district.clone())
            .filter(|d| !d.is_empty())
            .or_else(|| {
                case.stakeholder
                    .as_ref()
                    .map(|s| s.vehicle_location.name.clone())
                    .filter(|n| !n.is_empty())
            });

        Self {
            registration_number: details
                .registration_number
                .clone()
                .unwrap_or_else(|| case.vehicle_number.clone()),
            make: details.make,
            model: details.model,
            year_of_mfg: details.year_of_mfg,
            colour: details.colour,
            fuel: details.fuel,
            engine_cc: details.engine_cc,
            idv: details.idv,
            date_of_registration: details.date_of_registration,
            city,
            odometer: case.inspection_details.as_ref().and_then(|i| i.odometer),
        }
    }

    /// Bullet list of the known facts, one per line.
    pub fn describe(&self) -> String {
        fn line(out: &mut String, label: &str, value: Option<String>) {
            let _ = writeln!(out, "- {label}: {}", value.unwrap_or_default());
        }

        let mut out = String::new();
        line(&mut out, "RegistrationNumber", Some(self.registration_number.clone()));
        line(&mut out, "Make", self.make.clone());
        line(&mut out, "Model", self.model.clone());
        line(&mut out, "YearOfMfg", self.year_of_mfg.map(|v| v.to_string()));
        line(&mut out, "Colour", self.colour.clone());
        line(&mut out, "Fuel", self.fuel.clone());
        line(&mut out, "EngineCC", self.engine_cc.map(|v| v.to_string()));
        line(&mut out, "IDV", self.idv.map(|v| v.to_string()));
        line(
            &mut out,
            "DateOfRegistration",
            self.date_of_registration.map(|d| d.format("%Y-%m-%d").to_string()),
        );
        line(&mut out, "City", self.city.clone());
        line(&mut out, "Odometer", self.odometer.map(|v| v.to_string()));
        out
    }
}

#[async_trait]
pub trait ValuationEstimator: Send + Sync {
    /// Raw model output describing the price bands
    async fn estimate(&self, facts: &VehicleFacts) -> Result<String, EstimatorError>;
}

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("Estimator unreachable: {0}")]
    Network(String),

    #[error("Estimator authentication failed: {0}")]
    Authentication(String),

    #[error("Estimator rate limit exceeded")]
    RateLimit,

    #[error("Estimator API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Estimator returned no content")]
    EmptyResponse,
}

fn band_regex(label: &str) -> Regex {
    let pattern = format!(
        r"(?i)\b{label}\b[^₹\n]*₹\s*([\d,]+(?:\.\d+)?)\s*(lakhs?|lacs?|l|crores?|cr)?\b"
    );
    Regex::new(&pattern).expect("price band pattern is valid")
}

fn bands() -> &'static [Regex; 3] {
    static BANDS: OnceLock<[Regex; 3]> = OnceLock::new();
    BANDS.get_or_init(|| [band_regex("low"), band_regex("mid"), band_regex("high")])
}

fn parse_amount(digits: &str, unit: Option<&str>) -> Decimal {
    let cleaned: String = digits
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let base = match Decimal::from_str(&cleaned) {
        Ok(value) => value,
        Err(_) => return Decimal::ZERO,
    };
    let multiplier = match unit.map(str::to_ascii_lowercase).as_deref() {
        Some(u) if u.starts_with('l') => Decimal::from(100_000),
        Some(u) if u.starts_with('c') => Decimal::from(10_000_000),
        _ => Decimal::ONE,
    };
    // Figures past Decimal's range count as unparseable.
    base.checked_mul(multiplier)
        .map(|amount| amount.normalize())
        .unwrap_or(Decimal::ZERO)
}

fn find_band(re: &Regex, text: &str) -> Decimal {
    re.captures(text)
        .map(|caps| {
            let digits = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            parse_amount(digits, caps.get(2).map(|m| m.as_str()))
        })
        .unwrap_or(Decimal::ZERO)
}

/// Extract the three price bands from estimator output.
///
/// Accepts plain rupee figures (`₹8,50,000`) and lakh or crore shorthand
/// (`₹7.5 L`, `₹1.2 Cr`). The raw text is kept verbatim.
pub fn parse_price_bands(text: &str) -> ValuationResponse {
    let [low, mid, high] = bands();
    ValuationResponse {
        raw_response: text.to_string(),
        low_range: find_band(low, text),
        mid_range: find_band(mid, text),
        high_range: find_band(high, text),
    }
}
