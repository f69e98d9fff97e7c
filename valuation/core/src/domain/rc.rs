// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Registration certificate (RC) lookup
//!
//! The [`RcLookup`] port fetches the authoritative registration record for a
//! vehicle. [`VehicleDetails::merged_with`] folds that record into locally
//! entered details: fields the record provides overwrite, fields it lacks are
//! left alone, so merging the same record twice changes nothing.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::sections::VehicleDetails;

/// Typed registration record returned by an RC provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleRecord {
    pub registration_number: Option<String>,
    pub rc_status: Option<bool>,
    pub registered: Option<NaiveDate>,
    pub manufactured: Option<NaiveDate>,
    pub owner_name: Option<String>,
    pub owner_serial_no: Option<String>,
    pub present_address: Option<String>,
    pub permanent_address: Option<String>,
    pub category_code: Option<String>,
    pub class_of_vehicle: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub maker_variant: Option<String>,
    pub body_type: Option<String>,
    pub fuel: Option<String>,
    pub colour: Option<String>,
    pub chassis_number: Option<String>,
    pub engine_number: Option<String>,
    pub engine_cc: Option<u32>,
    pub gross_vehicle_weight: Option<f64>,
    pub seating_capacity: Option<u32>,
    pub financed: Option<bool>,
    pub lender: Option<String>,
    pub rto: Option<String>,
    pub norms_type: Option<String>,
    pub pollution_certificate_number: Option<String>,
    pub pollution_certificate_upto: Option<NaiveDate>,
    pub permit_no: Option<String>,
    pub permit_issued: Option<NaiveDate>,
    pub permit_from: Option<NaiveDate>,
    pub permit_type: Option<String>,
    pub permit_valid_up_to: Option<NaiveDate>,
    pub tax_upto: Option<NaiveDate>,
    pub tax_paid_upto: Option<String>,
    pub insurer: Option<String>,
    pub insurance_policy_no: Option<String>,
    pub insurance_valid_up_to: Option<NaiveDate>,
    pub ex_showroom_price: Option<Decimal>,
    pub blacklisted: Option<bool>,
}

#[async_trait]
pub trait RcLookup: Send + Sync {
    async fn lookup(&self, registration_number: &str) -> Result<VehicleRecord, LookupError>;
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("RC provider unreachable: {0}")]
    Unavailable(String),

    #[error("RC provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Registration {0} not found")]
    NotFound(String),

    #[error("Malformed RC response: {0}")]
    Malformed(String),
}

fn overwrite<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if let Some(value) = source {
        *target = Some(value.clone());
    }
}

impl VehicleDetails {
    /// Overlay every field `record` knows about.
    pub fn merged_with(mut self, record: &VehicleRecord) -> Self {
        overwrite(&mut self.registration_number, &record.registration_number);
        overwrite(&mut self.rc_status, &record.rc_status);
        overwrite(&mut self.date_of_registration, &record.registered);
        overwrite(&mut self.manufactured_date, &record.manufactured);
        overwrite(&mut self.owner_name, &record.owner_name);
        overwrite(&mut self.owner_serial_no, &record.owner_serial_no);
        overwrite(&mut self.present_address, &record.present_address);
        overwrite(&mut self.permanent_address, &record.permanent_address);
        overwrite(&mut self.category_code, &record.category_code);
        overwrite(&mut self.class_of_vehicle, &record.class_of_vehicle);
        overwrite(&mut self.make, &record.make);
        overwrite(&mut self.model, &record.model);
        overwrite(&mut self.maker_variant, &record.maker_variant);
        overwrite(&mut self.body_type, &record.body_type);
        overwrite(&mut self.fuel, &record.fuel);
        overwrite(&mut self.colour, &record.colour);
        overwrite(&mut self.chassis_number, &record.chassis_number);
        overwrite(&mut self.engine_number, &record.engine_number);
        overwrite(&mut self.engine_cc, &record.engine_cc);
        overwrite(&mut self.gross_vehicle_weight, &record.gross_vehicle_weight);
        overwrite(&mut self.seating_capacity, &record.seating_capacity);
        overwrite(&mut self.hypothecation, &record.financed);
        overwrite(&mut self.lender, &record.lender);
        overwrite(&mut self.rto, &record.rto);
        overwrite(&mut self.norms_type, &record.norms_type);
        overwrite(&mut self.pollution_certificate_number, &record.pollution_certificate_number);
        overwrite(&mut self.pollution_certificate_upto, &record.pollution_certificate_upto);
        overwrite(&mut self.permit_no, &record.permit_no);
        overwrite(&mut self.permit_issued, &record.permit_issued);
        overwrite(&mut self.permit_from, &record.permit_from);
        overwrite(&mut self.permit_type, &record.permit_type);
        overwrite(&mut self.permit_valid_up_to, &record.permit_valid_up_to);
        overwrite(&mut self.tax_upto, &record.tax_upto);
        overwrite(&mut self.tax_paid_upto, &record.tax_paid_upto);
        overwrite(&mut self.insurer, &record.insurer);
        overwrite(&mut self.insurance_policy_no, &record.insurance_policy_no);
        overwrite(&mut self.insurance_valid_up_to, &record.insurance_valid_up_to);
        overwrite(&mut self.ex_showroom_price, &record.ex_showroom_price);
        overwrite(&mut self.blacklist_status, &record.blacklisted);

        if let Some(manufactured) = record.manufactured {
            self.month_of_mfg = Some(manufactured.month());
            self.year_of_mfg = Some(manufactured.year());
        }
        self
    }
}
