// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP API
//!
//! Every case route addresses one case by the `{id}` path segment plus the
//! `vehicleNumber` and `applicantContact` query parameters. Handlers only
//! translate between HTTP and the application services.

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::application::container::ValuationServices;
use crate::application::error::{ServiceError, ServiceResult};
use crate::application::workflow_service::StepAnnotation;
use crate::domain::case::{CaseKey, OpenValuation, ValuationCase};
use crate::domain::mirror::{Assignment, WorkflowMirrorRecord};
use crate::domain::section::CaseSection;
use crate::domain::sections::{
    InspectionDetails, PhotoUrls, QualityControl, Stakeholder, ValuationResponse, VehicleDetails,
};
use crate::domain::workflow::{StepStatus, WorkflowStep};
use crate::presentation::upload::SectionForm;

/// Default request body cap; multipart uploads need more than axum's 2 MB.
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseQuery {
    pub vehicle_number: String,
    pub applicant_contact: String,
}

impl CaseQuery {
    fn key(&self, valuation_id: &str) -> ServiceResult<CaseKey> {
        Ok(CaseKey::parse(valuation_id, &self.vehicle_number, &self.applicant_contact)?)
    }
}

/// Writable columns of a workflow mirror row; identity comes from the request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorRowRequest {
    #[serde(default)]
    pub applicant_name: String,
    #[serde(default)]
    pub location: String,
    pub workflow: String,
    pub workflow_step_order: u32,
    pub status: StepStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub valuation_type: Option<String>,
    #[serde(default)]
    pub red_flag: Option<bool>,
    #[serde(default)]
    pub remarks: Option<String>,
    /// Unset columns keep their stored values
    #[serde(flatten)]
    pub assignment: Assignment,
}

pub fn app(services: ValuationServices) -> Router {
    router(services, DEFAULT_BODY_LIMIT)
}

pub fn router(services: ValuationServices, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/valuations/open", get(list_open))
        .route("/valuations/{id}", get(get_case).delete(delete_case))
        .route(
            "/valuations/{id}/stakeholder",
            get(get_stakeholder).put(put_stakeholder).delete(delete_stakeholder),
        )
        .route(
            "/valuations/{id}/vehicledetails",
            get(get_section::<VehicleDetails>)
                .put(put_section::<VehicleDetails>)
                .delete(delete_section::<VehicleDetails>),
        )
        .route("/valuations/{id}/vehicledetails/with-rc", get(vehicle_details_with_rc))
        .route(
            "/valuations/{id}/inspection",
            get(get_section::<InspectionDetails>)
                .put(put_section::<InspectionDetails>)
                .delete(delete_section::<InspectionDetails>),
        )
        .route(
            "/valuations/{id}/qualitycontrol",
            get(get_section::<QualityControl>)
                .put(put_section::<QualityControl>)
                .delete(delete_section::<QualityControl>),
        )
        .route(
            "/valuations/{id}/valuationresponse",
            get(get_section::<ValuationResponse>)
                .put(put_section::<ValuationResponse>)
                .delete(delete_section::<ValuationResponse>),
        )
        .route("/valuations/{id}/valuation", post(run_valuation))
        .route(
            "/valuations/{id}/photos",
            get(get_photos).put(put_photos).delete(delete_photos),
        )
        .route("/valuations/{id}/workflow", get(get_workflow).delete(delete_workflow))
        .route("/valuations/{id}/workflow/{step}/start", post(start_step))
        .route("/valuations/{id}/workflow/{step}/complete", post(complete_step))
        .route("/valuations/{id}/workflow/{step}/annotations", put(annotate_step))
        .route(
            "/valuations/{id}/workflow/table",
            get(get_mirror).put(put_mirror).delete(delete_mirror),
        )
        .route("/workflows/in-progress", get(list_in_progress))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(services)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

// Cases

async fn list_open(
    State(services): State<ValuationServices>,
) -> ServiceResult<Json<Vec<OpenValuation>>> {
    Ok(Json(services.workflow.list_open_cases().await?))
}

async fn get_case(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<Json<ValuationCase>> {
    let key = query.key(&id)?;
    Ok(Json(services.cases.get_case(&key).await?))
}

async fn delete_case(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<StatusCode> {
    let key = query.key(&id)?;
    services.cases.delete_case(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Generic sections

async fn get_section<S: CaseSection>(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<Json<S>> {
    let key = query.key(&id)?;
    Ok(Json(services.sections.get::<S>(&key).await?))
}

async fn put_section<S: CaseSection>(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
    form: SectionForm<S>,
) -> ServiceResult<Json<S>> {
    let key = query.key(&id)?;
    Ok(Json(services.sections.upsert::<S>(&key, form.payload, form.files).await?))
}

async fn delete_section<S: CaseSection>(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<StatusCode> {
    let key = query.key(&id)?;
    services.sections.delete::<S>(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Stakeholder

async fn get_stakeholder(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<Json<Stakeholder>> {
    let key = query.key(&id)?;
    Ok(Json(services.stakeholder.get(&key).await?))
}

async fn put_stakeholder(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
    form: SectionForm<Stakeholder>,
) -> ServiceResult<Json<Stakeholder>> {
    let key = query.key(&id)?;
    Ok(Json(services.stakeholder.upsert(&key, form.payload, form.files).await?))
}

async fn delete_stakeholder(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<StatusCode> {
    let key = query.key(&id)?;
    services.stakeholder.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Enrichment

async fn vehicle_details_with_rc(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<Json<VehicleDetails>> {
    let key = query.key(&id)?;
    Ok(Json(services.vehicle_details.with_rc_check(&key).await?))
}

async fn run_valuation(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<Json<ValuationResponse>> {
    let key = query.key(&id)?;
    Ok(Json(services.valuation.estimate(&key).await?))
}

// Photos

async fn get_photos(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<Json<PhotoUrls>> {
    let key = query.key(&id)?;
    Ok(Json(services.photos.get(&key).await?))
}

async fn put_photos(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
    form: SectionForm<PhotoUrls>,
) -> ServiceResult<Json<PhotoUrls>> {
    let key = query.key(&id)?;
    Ok(Json(services.photos.upsert(&key, form.payload, form.files).await?))
}

async fn delete_photos(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<StatusCode> {
    let key = query.key(&id)?;
    services.photos.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Workflow

async fn get_workflow(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<Json<Vec<WorkflowStep>>> {
    let key = query.key(&id)?;
    Ok(Json(services.workflow.get_workflow(&key).await?))
}

async fn delete_workflow(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<StatusCode> {
    let key = query.key(&id)?;
    services.workflow.delete_workflow(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn start_step(
    State(services): State<ValuationServices>,
    Path((id, step)): Path<(String, u32)>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<Json<WorkflowStep>> {
    let key = query.key(&id)?;
    Ok(Json(services.workflow.start_step(&key, step).await?))
}

async fn complete_step(
    State(services): State<ValuationServices>,
    Path((id, step)): Path<(String, u32)>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<Json<WorkflowStep>> {
    let key = query.key(&id)?;
    Ok(Json(services.workflow.complete_step(&key, step).await?))
}

async fn annotate_step(
    State(services): State<ValuationServices>,
    Path((id, step)): Path<(String, u32)>,
    Query(query): Query<CaseQuery>,
    Json(annotation): Json<StepAnnotation>,
) -> ServiceResult<Json<WorkflowStep>> {
    let key = query.key(&id)?;
    Ok(Json(services.workflow.annotate_step(&key, step, annotation).await?))
}

// Workflow mirror table

async fn get_mirror(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<Json<WorkflowMirrorRecord>> {
    let key = query.key(&id)?;
    services
        .mirror
        .get(&key)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No workflow table row for valuation {}",
                key.valuation_id
            ))
        })
}

async fn put_mirror(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
    Json(row): Json<MirrorRowRequest>,
) -> ServiceResult<Json<WorkflowMirrorRecord>> {
    let key = query.key(&id)?;
    let record = WorkflowMirrorRecord {
        valuation_id: key.valuation_id.clone(),
        partition_key: key.partition_key(),
        vehicle_number: key.vehicle_number.clone(),
        applicant_name: row.applicant_name,
        applicant_contact: key.applicant_contact.clone(),
        location: row.location,
        workflow: row.workflow,
        workflow_step_order: row.workflow_step_order,
        status: row.status,
        created_at: Utc::now(),
        completed_at: row.completed_at,
        name: row.name,
        valuation_type: row.valuation_type,
        red_flag: row.red_flag,
        remarks: row.remarks,
        assignment: row.assignment,
    };
    Ok(Json(services.mirror.upsert(&key, record).await?))
}

async fn delete_mirror(
    State(services): State<ValuationServices>,
    Path(id): Path<String>,
    Query(query): Query<CaseQuery>,
) -> ServiceResult<StatusCode> {
    let key = query.key(&id)?;
    services.mirror.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_in_progress(
    State(services): State<ValuationServices>,
) -> ServiceResult<Json<Vec<WorkflowMirrorRecord>>> {
    Ok(Json(services.mirror.list_in_progress().await?))
}
