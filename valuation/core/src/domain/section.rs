// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Case section capability
//!
//! [`CaseSection`] describes one addressable field of the case aggregate: how
//! to reach it, which upload fields it accepts, and how an incoming payload
//! plus freshly uploaded files become the stored value. The generic section
//! service in `application::sections` drives every section through the same
//! load, patch, save cycle using only this trait.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::case::ValuationCase;
use crate::domain::sections::{
    Document, DocumentType, InspectionDetails, PhotoSlot, PhotoUrls, QualityControl, Stakeholder,
    ValuationResponse, VehicleDetails,
};
use crate::domain::storage::UploadedFile;

pub trait CaseSection:
    Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Stable name used in logs, metrics and routes
    const NAME: &'static str;

    /// Multipart field names that carry files for this section
    const UPLOAD_FIELDS: &'static [&'static str] = &[];

    fn current(case: &ValuationCase) -> Option<&Self>;

    fn slot(case: &mut ValuationCase) -> &mut Option<Self>;

    fn accepts_field(field: &str) -> bool {
        Self::UPLOAD_FIELDS.contains(&field)
    }

    /// Build the value to store. `current` is the value already on the case.
    fn assemble(payload: Self, current: Option<Self>, files: &UploadedFiles) -> Self;
}

/// Results of the uploads performed for one section write
#[derive(Debug, Clone, Default)]
pub struct UploadedFiles(Vec<UploadedFile>);

impl UploadedFiles {
    pub fn new(files: Vec<UploadedFile>) -> Self {
        Self(files)
    }

    pub fn first(&self, field: &str) -> Option<&UploadedFile> {
        self.0.iter().find(|f| f.field == field)
    }

    pub fn all<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a UploadedFile> + 'a {
        self.0.iter().filter(move |f| f.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedFile> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl CaseSection for Stakeholder {
    const NAME: &'static str = "stakeholder";
    const UPLOAD_FIELDS: &'static [&'static str] = &["rcFile", "insuranceFile", "otherFiles"];

    fn current(case: &ValuationCase) -> Option<&Self> {
        case.stakeholder.as_ref()
    }

    fn slot(case: &mut ValuationCase) -> &mut Option<Self> {
        &mut case.stakeholder
    }

    fn assemble(mut payload: Self, _current: Option<Self>, files: &UploadedFiles) -> Self {
        for file in files.iter() {
            let doc_type = match file.field.as_str() {
                "rcFile" => DocumentType::Rc,
                "insuranceFile" => DocumentType::Insurance,
                _ => DocumentType::Other,
            };
            payload.documents.push(Document {
                doc_type,
                url: file.url.clone(),
                uploaded_at: file.uploaded_at,
            });
        }
        payload
    }
}

impl CaseSection for VehicleDetails {
    const NAME: &'static str = "vehicledetails";
    const UPLOAD_FIELDS: &'static [&'static str] = &["stencilTrace", "chassisNoPhoto"];

    fn current(case: &ValuationCase) -> Option<&Self> {
        case.vehicle_details.as_ref()
    }

    fn slot(case: &mut ValuationCase) -> &mut Option<Self> {
        &mut case.vehicle_details
    }

    fn assemble(mut payload: Self, _current: Option<Self>, files: &UploadedFiles) -> Self {
        if let Some(file) = files.first("stencilTrace") {
            payload.stencil_trace_url = Some(file.url.clone());
        }
        if let Some(file) = files.first("chassisNoPhoto") {
            payload.chassis_no_photo_url = Some(file.url.clone());
        }
        payload
    }
}

impl CaseSection for InspectionDetails {
    const NAME: &'static str = "inspection";
    const UPLOAD_FIELDS: &'static [&'static str] = &["photos"];

    fn current(case: &ValuationCase) -> Option<&Self> {
        case.inspection_details.as_ref()
    }

    fn slot(case: &mut ValuationCase) -> &mut Option<Self> {
        &mut case.inspection_details
    }

    fn assemble(mut payload: Self, _current: Option<Self>, files: &UploadedFiles) -> Self {
        payload
            .photos
            .extend(files.all("photos").map(|f| f.url.clone()));
        payload
    }
}

impl CaseSection for QualityControl {
    const NAME: &'static str = "qualitycontrol";

    fn current(case: &ValuationCase) -> Option<&Self> {
        case.quality_control.as_ref()
    }

    fn slot(case: &mut ValuationCase) -> &mut Option<Self> {
        &mut case.quality_control
    }

    fn assemble(payload: Self, _current: Option<Self>, _files: &UploadedFiles) -> Self {
        payload
    }
}

impl CaseSection for ValuationResponse {
    const NAME: &'static str = "valuationresponse";

    fn current(case: &ValuationCase) -> Option<&Self> {
        case.valuation_response.as_ref()
    }

    fn slot(case: &mut ValuationCase) -> &mut Option<Self> {
        &mut case.valuation_response
    }

    fn assemble(payload: Self, _current: Option<Self>, _files: &UploadedFiles) -> Self {
        payload
    }
}

/// Photos are captured one slot at a time, so a write overlays the supplied
/// slots on the stored map instead of replacing it.
impl CaseSection for PhotoUrls {
    const NAME: &'static str = "photos";

    fn current(case: &ValuationCase) -> Option<&Self> {
        case.photo_urls.as_ref()
    }

    fn slot(case: &mut ValuationCase) -> &mut Option<Self> {
        &mut case.photo_urls
    }

    fn accepts_field(field: &str) -> bool {
        field.parse::<PhotoSlot>().is_ok()
    }

    fn assemble(payload: Self, current: Option<Self>, files: &UploadedFiles) -> Self {
        let mut merged = current.unwrap_or_default();
        for (slot, url) in payload.0 {
            merged.insert(slot, url);
        }
        for file in files.iter() {
            if let Ok(slot) = file.field.parse::<PhotoSlot>() {
                merged.insert(slot, file.url.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn uploaded(field: &str, url: &str) -> UploadedFile {
        UploadedFile {
            field: field.to_string(),
            file_name: format!("{field}.jpg"),
            url: url.to_string(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_stakeholder_documents_typed_by_field() {
        let files = UploadedFiles::new(vec![
            uploaded("rcFile", "u-rc"),
            uploaded("insuranceFile", "u-ins"),
            uploaded("otherFiles", "u-o1"),
            uploaded("otherFiles", "u-o2"),
        ]);
        let out = Stakeholder::assemble(Stakeholder::default(), None, &files);
        let types: Vec<_> = out.documents.iter().map(|d| d.doc_type).collect();
        assert_eq!(
            types,
            vec![
                DocumentType::Rc,
                DocumentType::Insurance,
                DocumentType::Other,
                DocumentType::Other
            ]
        );
    }

    #[test]
    fn test_vehicle_details_upload_wins_over_payload_url() {
        let payload = VehicleDetails {
            stencil_trace_url: Some("old".into()),
            chassis_no_photo_url: Some("kept".into()),
            ..Default::default()
        };
        let files = UploadedFiles::new(vec![uploaded("stencilTrace", "new")]);
        let out = VehicleDetails::assemble(payload, None, &files);
        assert_eq!(out.stencil_trace_url.as_deref(), Some("new"));
        assert_eq!(out.chassis_no_photo_url.as_deref(), Some("kept"));
    }

    #[test]
    fn test_non_photo_sections_replace_current() {
        let current = QualityControl {
            overall_rating: "Good".into(),
            remarks: Some("first".into()),
            ..Default::default()
        };
        let payload = QualityControl {
            overall_rating: "Average".into(),
            ..Default::default()
        };
        let out =
            QualityControl::assemble(payload.clone(), Some(current), &UploadedFiles::default());
        assert_eq!(out, payload);
    }

    #[test]
    fn test_photos_overlay_existing_slots() {
        let mut current = PhotoUrls::default();
        current.insert(PhotoSlot::Odometer, "odo-1");
        current.insert(PhotoSlot::EngineBay, "engine-1");

        let files = UploadedFiles::new(vec![
            uploaded("engineBay", "engine-2"),
            uploaded("Underbody", "under-1"),
        ]);
        let out = PhotoUrls::assemble(PhotoUrls::default(), Some(current), &files);

        assert_eq!(out.get(PhotoSlot::Odometer), Some("odo-1"));
        assert_eq!(out.get(PhotoSlot::EngineBay), Some("engine-2"));
        assert_eq!(out.get(PhotoSlot::Underbody), Some("under-1"));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_accepts_field() {
        assert!(Stakeholder::accepts_field("rcFile"));
        assert!(!Stakeholder::accepts_field("photos"));
        assert!(PhotoUrls::accepts_field("dashboardCloseup"));
        assert!(!PhotoUrls::accepts_field("roof"));
        assert!(!QualityControl::accepts_field("anything"));
    }
}
