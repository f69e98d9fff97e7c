// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Case section payloads
//!
//! Plain data carried inside a [`crate::domain::case::ValuationCase`]. Every
//! section is optional on the case and defaults to an empty value on lenient
//! reads, so every type here implements [`Default`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

// ============================================================================
// Stakeholder
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "RC")]
    Rc,
    Insurance,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    #[serde(alias = "filePath")]
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleLocation {
    pub pincode: String,
    pub name: String,
    pub block: String,
    pub district: String,
    pub division: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Applicant {
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stakeholder {
    pub name: String,
    pub executive_name: String,
    pub executive_contact: String,
    pub executive_whatsapp: Option<String>,
    pub executive_email: Option<String>,
    pub valuation_type: Option<String>,
    pub vehicle_segment: Option<String>,
    pub vehicle_location: VehicleLocation,
    pub applicant: Applicant,
    pub documents: Vec<Document>,
}

// ============================================================================
// Vehicle details
// ============================================================================

/// Registration certificate and identification data for the vehicle.
///
/// Most fields are optional because the record is filled incrementally, by
/// hand and from the RC lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleDetails {
    pub registration_number: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub month_of_mfg: Option<u32>,
    pub year_of_mfg: Option<i32>,
    pub body_type: Option<String>,
    pub chassis_number: Option<String>,
    pub engine_number: Option<String>,
    pub colour: Option<String>,
    pub fuel: Option<String>,
    pub owner_name: Option<String>,
    pub present_address: Option<String>,
    pub permanent_address: Option<String>,
    pub hypothecation: Option<bool>,
    pub insurer: Option<String>,
    pub date_of_registration: Option<NaiveDate>,
    pub class_of_vehicle: Option<String>,
    #[serde(rename = "engineCC")]
    pub engine_cc: Option<u32>,
    pub gross_vehicle_weight: Option<f64>,
    pub owner_serial_no: Option<String>,
    pub seating_capacity: Option<u32>,
    pub insurance_policy_no: Option<String>,
    pub insurance_valid_up_to: Option<NaiveDate>,
    #[serde(rename = "idv")]
    pub idv: Option<Decimal>,
    pub permit_no: Option<String>,
    pub permit_valid_up_to: Option<NaiveDate>,
    pub permit_type: Option<String>,
    pub permit_issued: Option<NaiveDate>,
    pub permit_from: Option<NaiveDate>,
    pub fitness_no: Option<String>,
    pub fitness_valid_to: Option<NaiveDate>,
    pub blacklist_status: Option<bool>,
    pub rc_status: Option<bool>,
    pub rto: Option<String>,
    pub lender: Option<String>,
    pub ex_showroom_price: Option<Decimal>,
    pub category_code: Option<String>,
    pub norms_type: Option<String>,
    pub maker_variant: Option<String>,
    pub pollution_certificate_number: Option<String>,
    pub pollution_certificate_upto: Option<NaiveDate>,
    pub tax_upto: Option<NaiveDate>,
    pub tax_paid_upto: Option<String>,
    pub manufactured_date: Option<NaiveDate>,
    pub stencil_trace_url: Option<String>,
    pub chassis_no_photo_url: Option<String>,
}

// ============================================================================
// Inspection
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InspectionDetails {
    pub vehicle_inspected_by: Option<String>,
    pub date_of_inspection: Option<NaiveDate>,
    pub inspection_location: Option<String>,
    pub vehicle_moved: Option<bool>,
    pub engine_started: Option<bool>,
    pub odometer: Option<u64>,
    pub vin_plate: Option<bool>,
    pub body_type: Option<String>,
    pub overall_tyre_condition: Option<String>,
    pub other_accessory_fitment: Option<bool>,
    pub windshield_glass: Option<String>,
    pub road_worthy_condition: Option<bool>,

    pub engine_condition: Option<String>,
    pub suspension_system: Option<String>,
    pub steering_assy: Option<String>,
    pub brake_system: Option<String>,
    pub chassis_condition: Option<String>,
    pub body_condition: Option<String>,
    pub battery_condition: Option<String>,
    pub paint_work: Option<String>,

    pub clutch_system: Option<String>,
    pub gear_box_assy: Option<String>,
    pub propeller_shaft: Option<String>,
    pub differential_assy: Option<String>,

    pub cabin: Option<String>,
    pub dashboard: Option<String>,
    pub seats: Option<String>,

    pub head_lamps: Option<String>,
    pub electric_assembly: Option<String>,

    pub radiator: Option<String>,
    pub intercooler: Option<String>,
    pub all_hose_pipes: Option<String>,

    pub fuel_system: Option<String>,
    pub exterior_condition: Option<String>,
    pub interior_condition: Option<String>,
    pub drive_shafts: Option<String>,
    pub front_axles: Option<String>,
    pub rear_axles: Option<String>,
    pub air_conditioner: Option<String>,

    pub photos: Vec<String>,
}

// ============================================================================
// Quality control & valuation
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityControl {
    pub overall_rating: String,
    pub valuation_amount: Decimal,
    pub chassis_punch: String,
    pub remarks: Option<String>,
}

/// Estimated price band in INR
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValuationResponse {
    pub raw_response: String,
    pub low_range: Decimal,
    pub mid_range: Decimal,
    pub high_range: Decimal,
}

// ============================================================================
// Photos
// ============================================================================

/// Fixed capture positions for vehicle photos
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PhotoSlot {
    FrontLeftSide,
    FrontRightSide,
    RearLeftSide,
    RearRightSide,
    FrontViewGrille,
    RearViewTailgate,
    DriverSideProfile,
    PassengerSideProfile,
    Dashboard,
    InstrumentCluster,
    EngineBay,
    ChassisNumberPlate,
    ChassisImprint,
    GearAndSeats,
    DashboardCloseup,
    Odometer,
    SelfieWithVehicle,
    Underbody,
    TiresAndRims,
}

impl PhotoSlot {
    pub const ALL: [PhotoSlot; 19] = [
        PhotoSlot::FrontLeftSide,
        PhotoSlot::FrontRightSide,
        PhotoSlot::RearLeftSide,
        PhotoSlot::RearRightSide,
        PhotoSlot::FrontViewGrille,
        PhotoSlot::RearViewTailgate,
        PhotoSlot::DriverSideProfile,
        PhotoSlot::PassengerSideProfile,
        PhotoSlot::Dashboard,
        PhotoSlot::InstrumentCluster,
        PhotoSlot::EngineBay,
        PhotoSlot::ChassisNumberPlate,
        PhotoSlot::ChassisImprint,
        PhotoSlot::GearAndSeats,
        PhotoSlot::DashboardCloseup,
        PhotoSlot::Odometer,
        PhotoSlot::SelfieWithVehicle,
        PhotoSlot::Underbody,
        PhotoSlot::TiresAndRims,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoSlot::FrontLeftSide => "FrontLeftSide",
            PhotoSlot::FrontRightSide => "FrontRightSide",
            PhotoSlot::RearLeftSide => "RearLeftSide",
            PhotoSlot::RearRightSide => "RearRightSide",
            PhotoSlot::FrontViewGrille => "FrontViewGrille",
            PhotoSlot::RearViewTailgate => "RearViewTailgate",
            PhotoSlot::DriverSideProfile => "DriverSideProfile",
            PhotoSlot::PassengerSideProfile => "PassengerSideProfile",
            PhotoSlot::Dashboard => "Dashboard",
            PhotoSlot::InstrumentCluster => "InstrumentCluster",
            PhotoSlot::EngineBay => "EngineBay",
            PhotoSlot::ChassisNumberPlate => "ChassisNumberPlate",
            PhotoSlot::ChassisImprint => "ChassisImprint",
            PhotoSlot::GearAndSeats => "GearAndSeats",
            PhotoSlot::DashboardCloseup => "DashboardCloseup",
            PhotoSlot::Odometer => "Odometer",
            PhotoSlot::SelfieWithVehicle => "SelfieWithVehicle",
            PhotoSlot::Underbody => "Underbody",
            PhotoSlot::TiresAndRims => "TiresAndRims",
        }
    }
}

impl std::fmt::Display for PhotoSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown photo slot '{0}'")]
pub struct UnknownPhotoSlot(pub String);

impl FromStr for PhotoSlot {
    type Err = UnknownPhotoSlot;

    /// Slot names match case-insensitively so form fields like
    /// `frontLeftSide` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhotoSlot::ALL
            .iter()
            .copied()
            .find(|slot| slot.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPhotoSlot(s.to_string()))
    }
}

/// Slot to URL map stored on the case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoUrls(pub BTreeMap<PhotoSlot, String>);

impl PhotoUrls {
    pub fn get(&self, slot: PhotoSlot) -> Option<&str> {
        self.0.get(&slot).map(String::as_str)
    }

    pub fn insert(&mut self, slot: PhotoSlot, url: impl Into<String>) {
        self.0.insert(slot, url.into());
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_slot_parse_is_case_insensitive() {
        assert_eq!("frontLeftSide".parse::<PhotoSlot>().unwrap(), PhotoSlot::FrontLeftSide);
        assert_eq!("TIRESANDRIMS".parse::<PhotoSlot>().unwrap(), PhotoSlot::TiresAndRims);
        assert!("Roof".parse::<PhotoSlot>().is_err());
    }

    #[test]
    fn test_photo_slots_are_distinct() {
        let names: std::collections::HashSet<_> =
            PhotoSlot::ALL.iter().map(PhotoSlot::as_str).collect();
        assert_eq!(names.len(), 19);
    }

    #[test]
    fn test_document_accepts_legacy_file_path() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "type": "RC",
            "filePath": "https://blob/rc.pdf",
            "uploadedAt": "2026-02-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(doc.doc_type, DocumentType::Rc);
        assert_eq!(doc.url, "https://blob/rc.pdf");
    }

    #[test]
    fn test_photo_urls_serialize_as_object() {
        let mut photos = PhotoUrls::default();
        photos.insert(PhotoSlot::Odometer, "u1");
        let json = serde_json::to_value(&photos).unwrap();
        assert_eq!(json, serde_json::json!({ "Odometer": "u1" }));
    }

    #[test]
    fn test_stakeholder_defaults_missing_fields() {
        let s: Stakeholder =
            serde_json::from_value(serde_json::json!({ "name": "Acme Finance" })).unwrap();
        assert_eq!(s.name, "Acme Finance");
        assert!(s.documents.is_empty());
        assert_eq!(s.vehicle_location, VehicleLocation::default());
    }
}
