// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// RC Lookup HTTP Adapter
//
// Anti-Corruption Layer for the registration-certificate provider. The
// provider returns most numbers and dates as strings in assorted formats;
// this adapter parses them into the typed VehicleRecord.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::config::{resolve_secret, RcLookupConfig};
use crate::domain::rc::{LookupError, RcLookup, VehicleRecord};

pub struct HttpRcLookup {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct LookupRequest<'a> {
    reg: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProviderRecord {
    valid: bool,
    status: Option<String>,
    registered: Option<String>,
    manufactured: Option<String>,
    owner: Option<String>,
    current_address: Option<String>,
    permanent_address: Option<String>,
    category: Option<String>,
    category_description: Option<String>,
    maker_description: Option<String>,
    maker_model: Option<String>,
    maker_variant: Option<String>,
    body_type: Option<String>,
    fuel_type: Option<String>,
    color_type: Option<String>,
    chassis_number: Option<String>,
    engine_number: Option<String>,
    cubic_capacity: Option<String>,
    gross_weight: Option<String>,
    seating_capacity: Option<String>,
    financed: Option<bool>,
    lender: Option<String>,
    rto: Option<String>,
    norms_type: Option<String>,
    pollution_certificate_number: Option<String>,
    pollution_certificate_upto: Option<String>,
    permit_number: Option<String>,
    permit_issued: Option<String>,
    permit_from: Option<String>,
    permit_type: Option<String>,
    permit_upto: Option<String>,
    tax_upto: Option<String>,
    tax_paid_upto: Option<String>,
    insurance_provider: Option<String>,
    insurance_policy_number: Option<String>,
    insurance_upto: Option<String>,
    ex_showroom_price: Option<Decimal>,
    blacklist_status: Option<String>,
}

impl HttpRcLookup {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &RcLookupConfig) -> anyhow::Result<Self> {
        let api_key = resolve_secret(&config.api_key)
            .ok_or_else(|| anyhow::anyhow!("rc_lookup.api_key references an unset variable"))?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl RcLookup for HttpRcLookup {
    async fn lookup(&self, registration_number: &str) -> Result<VehicleRecord, LookupError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Basic {}", self.api_key))
            .json(&LookupRequest { reg: registration_number })
            .send()
            .await
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == 404 {
            return Err(LookupError::NotFound(registration_number.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LookupError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let record: ProviderRecord = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;

        if !record.valid {
            return Err(LookupError::NotFound(registration_number.to_string()));
        }

        debug!(registration_number, "RC record received");
        Ok(record.into_vehicle_record(registration_number))
    }
}

impl ProviderRecord {
    fn into_vehicle_record(self, registration_number: &str) -> VehicleRecord {
        let rc_status = Some(
            self.status
                .as_deref()
                .map(|s| s.trim().eq_ignore_ascii_case("active"))
                .unwrap_or(true),
        );

        VehicleRecord {
            registration_number: Some(registration_number.to_string()),
            rc_status,
            registered: self.registered.as_deref().and_then(parse_date),
            manufactured: self.manufactured.as_deref().and_then(parse_date),
            owner_name: non_empty(self.owner),
            owner_serial_no: None,
            present_address: non_empty(self.current_address),
            permanent_address: non_empty(self.permanent_address),
            category_code: non_empty(self.category),
            class_of_vehicle: non_empty(self.category_description),
            make: non_empty(self.maker_description),
            model: non_empty(self.maker_model),
            maker_variant: non_empty(self.maker_variant),
            body_type: non_empty(self.body_type),
            fuel: non_empty(self.fuel_type),
            colour: non_empty(self.color_type),
            chassis_number: non_empty(self.chassis_number),
            engine_number: non_empty(self.engine_number),
            engine_cc: self.cubic_capacity.as_deref().and_then(parse_whole),
            gross_vehicle_weight: self.gross_weight.as_deref().and_then(|v| v.trim().parse().ok()),
            seating_capacity: self.seating_capacity.as_deref().and_then(parse_whole),
            financed: self.financed,
            lender: non_empty(self.lender),
            rto: non_empty(self.rto),
            norms_type: non_empty(self.norms_type),
            pollution_certificate_number: non_empty(self.pollution_certificate_number),
            pollution_certificate_upto: self
                .pollution_certificate_upto
                .as_deref()
                .and_then(parse_date),
            permit_no: non_empty(self.permit_number),
            permit_issued: self.permit_issued.as_deref().and_then(parse_date),
            permit_from: self.permit_from.as_deref().and_then(parse_date),
            permit_type: non_empty(self.permit_type),
            permit_valid_up_to: self.permit_upto.as_deref().and_then(parse_date),
            tax_upto: self.tax_upto.as_deref().and_then(parse_date),
            tax_paid_upto: non_empty(self.tax_paid_upto),
            insurer: non_empty(self.insurance_provider),
            insurance_policy_no: non_empty(self.insurance_policy_number),
            insurance_valid_up_to: self.insurance_upto.as_deref().and_then(parse_date),
            ex_showroom_price: self.ex_showroom_price,
            blacklisted: self.blacklist_status.as_deref().and_then(parse_blacklist),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Whole number from strings like "1197", "1197.00" or "5 seats".
fn parse_whole(value: &str) -> Option<u32> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Provider dates arrive as ISO, day-first numeric, `10-May-2019` or
/// month-only `May-2019` (taken as the first of the month).
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let value = value.split_once('T').map_or(value, |(date, _)| date);
    if value.is_empty() {
        return None;
    }

    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d-%b-%Y"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| NaiveDate::parse_from_str(&format!("01-{value}"), "%d-%b-%Y").ok())
}

fn parse_blacklist(value: &str) -> Option<bool> {
    let value = value.trim().to_ascii_lowercase();
    if value.is_empty() || value == "na" {
        return None;
    }
    let clear = value.starts_with("not")
        || value.starts_with("no")
        || value == "false"
        || value == "clear";
    Some(!clear)
}
