// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Section read / patch / delete behaviour, uploads and the workflow mirror.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rust_decimal::Decimal;

use valuation_core::application::error::ServiceError;
use valuation_core::application::repository_factory::Repositories;
use valuation_core::application::ValuationServices;
use valuation_core::domain::case::CaseKey;
use valuation_core::domain::estimator::{EstimatorError, ValuationEstimator, VehicleFacts};
use valuation_core::domain::mirror::WorkflowMirrorRecord;
use valuation_core::domain::rc::{LookupError, RcLookup, VehicleRecord};
use valuation_core::domain::repository::{RepositoryError, WorkflowMirrorRepository};
use valuation_core::domain::sections::{
    Applicant, DocumentType, InspectionDetails, PhotoSlot, PhotoUrls, QualityControl, Stakeholder,
    VehicleDetails,
};
use valuation_core::domain::storage::{BlobStore, FileUpload, StorageError};
use valuation_core::domain::workflow::StepStatus;
use valuation_core::infrastructure::repositories::{
    InMemoryCaseRepository, InMemoryWorkflowMirrorRepository,
};
use valuation_core::infrastructure::storage::InMemoryBlobStore;

fn key(id: &str) -> CaseKey {
    CaseKey::new(id, "KA01AB1234", "9876543210")
}

fn file(field: &str, name: &str) -> FileUpload {
    FileUpload {
        field: field.into(),
        file_name: name.into(),
        content_type: "image/jpeg".into(),
        bytes: Bytes::from_static(b"\xff\xd8\xff"),
    }
}

fn stakeholder() -> Stakeholder {
    Stakeholder {
        name: "Acme Finance".into(),
        applicant: Applicant {
            name: "Ravi".into(),
            contact: "9876543210".into(),
        },
        ..Default::default()
    }
}

fn services_with_blobs(blobs: Arc<dyn BlobStore>) -> ValuationServices {
    ValuationServices::new(Repositories::in_memory(), blobs, None, None)
}

/// Rejects uploads of `bad.jpg`.
struct SelectiveBlobStore {
    inner: InMemoryBlobStore,
}

#[async_trait]
impl BlobStore for SelectiveBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if path.ends_with("-bad.jpg") {
            return Err(StorageError::Backend("disk full".into()));
        }
        self.inner.upload(path, bytes, content_type).await
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        self.inner.delete(url).await
    }
}

struct BrokenMirror;

#[async_trait]
impl WorkflowMirrorRepository for BrokenMirror {
    async fn upsert(&self, _record: &WorkflowMirrorRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Database("reference table offline".into()))
    }

    async fn get(
        &self,
        _pk: &str,
        _id: &str,
    ) -> Result<Option<WorkflowMirrorRecord>, RepositoryError> {
        Err(RepositoryError::Database("reference table offline".into()))
    }

    async fn delete(&self, _pk: &str, _id: &str) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_in_progress(&self) -> Result<Vec<WorkflowMirrorRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

/// Holds every step-1 write back, so later projections are ready first.
struct SlowFirstStepMirror {
    inner: InMemoryWorkflowMirrorRepository,
}

#[async_trait]
impl WorkflowMirrorRepository for SlowFirstStepMirror {
    async fn upsert(&self, record: &WorkflowMirrorRecord) -> Result<(), RepositoryError> {
        if record.workflow_step_order == 1 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        self.inner.upsert(record).await
    }

    async fn get(
        &self,
        partition_key: &str,
        valuation_id: &str,
    ) -> Result<Option<WorkflowMirrorRecord>, RepositoryError> {
        self.inner.get(partition_key, valuation_id).await
    }

    async fn delete(&self, partition_key: &str, valuation_id: &str) -> Result<(), RepositoryError> {
        self.inner.delete(partition_key, valuation_id).await
    }

    async fn list_in_progress(&self) -> Result<Vec<WorkflowMirrorRecord>, RepositoryError> {
        self.inner.list_in_progress().await
    }
}

struct FixedRc(VehicleRecord);

#[async_trait]
impl RcLookup for FixedRc {
    async fn lookup(&self, _registration_number: &str) -> Result<VehicleRecord, LookupError> {
        Ok(self.0.clone())
    }
}

struct DownRc;

#[async_trait]
impl RcLookup for DownRc {
    async fn lookup(&self, _registration_number: &str) -> Result<VehicleRecord, LookupError> {
        Err(LookupError::Unavailable("connection refused".into()))
    }
}

struct CannedEstimator(&'static str);

#[async_trait]
impl ValuationEstimator for CannedEstimator {
    async fn estimate(&self, _facts: &VehicleFacts) -> Result<String, EstimatorError> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn test_get_on_fresh_case_returns_default() {
    let services = services_with_blobs(Arc::new(InMemoryBlobStore::default()));
    let details = services.sections.get::<VehicleDetails>(&key("fresh")).await.unwrap();
    assert_eq!(details, VehicleDetails::default());
    assert!(services.cases.find(&key("fresh")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_on_missing_case_creates_nothing() {
    let services = services_with_blobs(Arc::new(InMemoryBlobStore::default()));
    services.sections.delete::<QualityControl>(&key("ghost")).await.unwrap();
    services.photos.delete(&key("ghost")).await.unwrap();
    assert!(services.cases.find(&key("ghost")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_replaces_section() {
    let services = services_with_blobs(Arc::new(InMemoryBlobStore::default()));
    let key = key("qc");

    let first = QualityControl {
        overall_rating: "Good".into(),
        valuation_amount: Decimal::from(450_000),
        chassis_punch: "OK".into(),
        remarks: Some("clean".into()),
    };
    services.sections.upsert(&key, first, Vec::new()).await.unwrap();

    let second = QualityControl {
        overall_rating: "Fair".into(),
        ..Default::default()
    };
    services.sections.upsert(&key, second.clone(), Vec::new()).await.unwrap();

    let stored = services.sections.get::<QualityControl>(&key).await.unwrap();
    assert_eq!(stored, second);
    assert_eq!(stored.remarks, None);

    services.sections.delete::<QualityControl>(&key).await.unwrap();
    let case = services.cases.get_case(&key).await.unwrap();
    assert!(case.quality_control.is_none());
    assert!(case.workflow.is_some());
}

#[tokio::test]
async fn test_stakeholder_uploads_become_documents() {
    let blobs = Arc::new(InMemoryBlobStore::default());
    let services = services_with_blobs(blobs.clone());
    let key = key("docs");

    let stored = services
        .stakeholder
        .upsert(
            &key,
            stakeholder(),
            vec![file("rcFile", "rc copy.pdf"), file("insuranceFile", "policy.pdf")],
        )
        .await
        .unwrap();

    assert_eq!(stored.documents.len(), 2);
    let rc = stored
        .documents
        .iter()
        .find(|d| d.doc_type == DocumentType::Rc)
        .unwrap();
    assert!(rc.url.starts_with("memory://blobs/KA01AB1234/9876543210/"));
    assert!(rc.url.ends_with("-rc_copy.pdf"));
    assert_eq!(blobs.len(), 2);
}

#[tokio::test]
async fn test_unexpected_upload_field_is_rejected() {
    let services = services_with_blobs(Arc::new(InMemoryBlobStore::default()));
    let err = services
        .sections
        .upsert(&key("qc"), QualityControl::default(), vec![file("photo", "x.jpg")])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_failed_upload_leaves_case_untouched() {
    let blobs = Arc::new(SelectiveBlobStore {
        inner: InMemoryBlobStore::default(),
    });
    let services = services_with_blobs(blobs);
    let key = key("inspect");

    // New case: nothing is created.
    let err = services
        .sections
        .upsert(
            &key,
            InspectionDetails::default(),
            vec![file("photos", "good.jpg"), file("photos", "bad.jpg")],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UploadFailure(_)));
    assert!(services.cases.find(&key).await.unwrap().is_none());

    // Existing case: the stored document keeps its version and content.
    let saved = services
        .sections
        .upsert(
            &key,
            InspectionDetails {
                odometer: Some(42_000),
                ..Default::default()
            },
            vec![file("photos", "good.jpg")],
        )
        .await
        .unwrap();
    let before = services.cases.get_case(&key).await.unwrap();

    let err = services
        .sections
        .upsert(&key, InspectionDetails::default(), vec![file("photos", "bad.jpg")])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UploadFailure(_)));

    let after = services.cases.get_case(&key).await.unwrap();
    assert_eq!(after.version, before.version);
    assert_eq!(after.inspection_details, Some(saved));
}

#[tokio::test]
async fn test_photos_overlay_by_slot() {
    let blobs = Arc::new(InMemoryBlobStore::default());
    let services = services_with_blobs(blobs.clone());
    let key = key("photos");

    services
        .photos
        .upsert(&key, PhotoUrls::default(), vec![file("FrontLeftSide", "fl.jpg")])
        .await
        .unwrap();
    let photos = services
        .photos
        .upsert(&key, PhotoUrls::default(), vec![file("odometer", "odo.jpg")])
        .await
        .unwrap();

    assert_eq!(photos.len(), 2);
    assert!(photos.get(PhotoSlot::FrontLeftSide).is_some());
    assert!(photos.get(PhotoSlot::Odometer).is_some());

    let err = services
        .photos
        .upsert(&key, PhotoUrls::default(), vec![file("Roof", "roof.jpg")])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    services.photos.delete(&key).await.unwrap();
    assert!(services.photos.get(&key).await.unwrap().is_empty());
    assert!(blobs.is_empty());
}

#[tokio::test]
async fn test_stakeholder_write_mirrors_workflow_position() {
    let services = services_with_blobs(Arc::new(InMemoryBlobStore::default()));
    let key = key("mirror");
    services.stakeholder.upsert(&key, stakeholder(), Vec::new()).await.unwrap();

    // The mirror write runs in the background.
    let mut record = None;
    for _ in 0..50 {
        record = services.mirror.get(&key).await.unwrap();
        if record.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let record = record.expect("mirror row written");
    assert_eq!(record.workflow, "Stakeholder");
    assert_eq!(record.workflow_step_order, 1);
    assert_eq!(record.status, StepStatus::InProgress);
    assert_eq!(record.applicant_name, "Ravi");
    assert_eq!(record.partition_key, "KA01AB1234|9876543210");
}

#[tokio::test]
async fn test_mirror_failure_does_not_fail_stakeholder_write() {
    let repositories = Repositories {
        cases: Arc::new(InMemoryCaseRepository::new()),
        mirror: Arc::new(BrokenMirror),
    };
    let services = ValuationServices::new(
        repositories,
        Arc::new(InMemoryBlobStore::default()),
        None,
        None,
    );
    let key = key("broken");

    let stored = services.stakeholder.upsert(&key, stakeholder(), Vec::new()).await.unwrap();
    assert_eq!(stored.name, "Acme Finance");
    assert!(services.cases.get_case(&key).await.unwrap().stakeholder.is_some());
}

#[tokio::test]
async fn test_mirror_table_operations() {
    let mirror_repo = Arc::new(InMemoryWorkflowMirrorRepository::new());
    let repositories = Repositories {
        cases: Arc::new(InMemoryCaseRepository::new()),
        mirror: mirror_repo,
    };
    let services = ValuationServices::new(
        repositories,
        Arc::new(InMemoryBlobStore::default()),
        None,
        None,
    );
    let key = key("table");

    services.stakeholder.upsert(&key, stakeholder(), Vec::new()).await.unwrap();
    services.workflow.complete_step(&key, 1).await.unwrap();
    services.workflow.start_step(&key, 2).await.unwrap();

    let mut in_progress = Vec::new();
    for _ in 0..50 {
        in_progress = services.mirror.list_in_progress().await.unwrap();
        if in_progress.first().is_some_and(|r| r.workflow_step_order == 2) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].workflow, "BackEnd");

    services.mirror.delete(&key).await.unwrap();
    services.mirror.delete(&key).await.unwrap();
    assert!(services.mirror.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_mirror_writes_land_in_publish_order() {
    let repositories = Repositories {
        cases: Arc::new(InMemoryCaseRepository::new()),
        mirror: Arc::new(SlowFirstStepMirror {
            inner: InMemoryWorkflowMirrorRepository::new(),
        }),
    };
    let services = ValuationServices::new(
        repositories,
        Arc::new(InMemoryBlobStore::default()),
        None,
        None,
    );
    let key = key("ordered");

    services.stakeholder.upsert(&key, stakeholder(), Vec::new()).await.unwrap();
    services.workflow.complete_step(&key, 1).await.unwrap();
    services.workflow.start_step(&key, 2).await.unwrap();

    let mut record = None;
    for _ in 0..50 {
        record = services.mirror.get(&key).await.unwrap();
        if record
            .as_ref()
            .is_some_and(|r| r.workflow_step_order == 2 && r.status == StepStatus::InProgress)
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let record = record.expect("mirror row written");
    assert_eq!(record.workflow_step_order, 2);
    assert_eq!(record.status, StepStatus::InProgress);

    // Nothing older is still queued behind the step-2 row.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let settled = services.mirror.get(&key).await.unwrap().unwrap();
    assert_eq!(settled.workflow_step_order, 2);
    assert_eq!(settled.status, StepStatus::InProgress);
}

#[tokio::test]
async fn test_rc_check_merges_and_is_idempotent() {
    let record = VehicleRecord {
        make: Some("MARUTI SUZUKI".into()),
        fuel: Some("PETROL".into()),
        financed: Some(true),
        ..Default::default()
    };
    let services = ValuationServices::new(
        Repositories::in_memory(),
        Arc::new(InMemoryBlobStore::default()),
        Some(Arc::new(FixedRc(record))),
        None,
    );
    let key = key("rc");

    let err = services.vehicle_details.with_rc_check(&key).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let local = VehicleDetails {
        colour: Some("White".into()),
        make: Some("Maruti".into()),
        ..Default::default()
    };
    services.sections.upsert(&key, local, Vec::new()).await.unwrap();

    let first = services.vehicle_details.with_rc_check(&key).await.unwrap();
    assert_eq!(first.make.as_deref(), Some("MARUTI SUZUKI"));
    assert_eq!(first.colour.as_deref(), Some("White"));
    assert_eq!(first.hypothecation, Some(true));

    let second = services.vehicle_details.with_rc_check(&key).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(services.sections.get::<VehicleDetails>(&key).await.unwrap(), second);
}

#[tokio::test]
async fn test_rc_failure_saves_nothing() {
    let services = ValuationServices::new(
        Repositories::in_memory(),
        Arc::new(InMemoryBlobStore::default()),
        Some(Arc::new(DownRc)),
        None,
    );
    let key = key("rc-down");
    services.stakeholder.upsert(&key, stakeholder(), Vec::new()).await.unwrap();
    let before = services.cases.get_case(&key).await.unwrap();

    let err = services.vehicle_details.with_rc_check(&key).await.unwrap_err();
    assert!(matches!(err, ServiceError::UpstreamUnavailable(_)));
    assert_eq!(services.cases.get_case(&key).await.unwrap().version, before.version);
}

#[tokio::test]
async fn test_estimate_stores_parsed_bands() {
    let services = ValuationServices::new(
        Repositories::in_memory(),
        Arc::new(InMemoryBlobStore::default()),
        None,
        Some(Arc::new(CannedEstimator(
            "Low: ₹4,20,000 - fair use\nMid: ₹4,50,000\nHigh range is unclear",
        ))),
    );
    let key = key("ai");

    let err = services.valuation.estimate(&key).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    services.stakeholder.upsert(&key, stakeholder(), Vec::new()).await.unwrap();
    let response = services.valuation.estimate(&key).await.unwrap();
    assert_eq!(response.low_range, Decimal::from(420_000));
    assert_eq!(response.mid_range, Decimal::from(450_000));
    assert_eq!(response.high_range, Decimal::ZERO);

    let case = services.cases.get_case(&key).await.unwrap();
    assert_eq!(case.valuation_response, Some(response));
}

#[tokio::test]
async fn test_missing_providers_are_upstream_errors() {
    let services = services_with_blobs(Arc::new(InMemoryBlobStore::default()));
    let key = key("none");
    services.stakeholder.upsert(&key, stakeholder(), Vec::new()).await.unwrap();

    assert!(matches!(
        services.vehicle_details.with_rc_check(&key).await,
        Err(ServiceError::UpstreamUnavailable(_))
    ));
    assert!(matches!(
        services.valuation.estimate(&key).await,
        Err(ServiceError::UpstreamUnavailable(_))
    ));
}

#[tokio::test]
async fn test_stale_save_conflicts() {
    let services = services_with_blobs(Arc::new(InMemoryBlobStore::default()));
    let key = key("race");
    services.stakeholder.upsert(&key, stakeholder(), Vec::new()).await.unwrap();

    let mut first = services.cases.get_case(&key).await.unwrap();
    let mut second = first.clone();

    services.cases.save(&mut first).await.unwrap();
    let err = services.cases.save(&mut second).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}
