//! Patient details screen endpoints.
//!
//! - `GET /api/intake/details`: catalogs, selections, last estimate
//! - `POST /api/intake/clinics`: create a clinic and select it
//! - `POST|DELETE /api/intake/clinics/:id`: select / deselect
//! - `POST /api/intake/providers`: create a provider and select it
//! - `GET|POST|DELETE /api/intake/providers/:id`: detail / select / deselect
//! - `POST /api/intake/drug`: save the drug and schedule the next screen

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::ensure_live;
use crate::api::error::ApiError;
use crate::api::types::{parse_id, ActionResponse, ApiContext};
use crate::intake::PatientDetailsView;
use crate::models::{Clinic, Provider};
use crate::pricing::DrugPricing;

#[derive(Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct DrugRequest {
    pub drug_name: String,
}

pub async fn view(State(ctx): State<ApiContext>) -> Result<Json<PatientDetailsView>, ApiError> {
    let conn = ctx.core.open_db()?;
    let flow = ctx.core.lock_flow()?;
    ensure_live(&flow)?;
    flow.patient_details(&conn)
        .map(Json)
        .ok_or_else(|| ApiError::Internal("Failed to load patient details".into()))
}

pub async fn create_clinic(
    State(ctx): State<ApiContext>,
    body: Result<Json<NameRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<Clinic>>, ApiError> {
    let Json(req) = body?;
    let conn = ctx.core.open_db()?;
    let mut flow = ctx.core.lock_flow()?;
    let created = flow.create_clinic(&conn, &req.name);
    Ok(Json(ActionResponse::from_option(flow.step(), created)))
}

pub async fn add_clinic(
    State(ctx): State<ApiContext>,
    Path(clinic_id): Path<String>,
) -> Result<Json<ActionResponse<()>>, ApiError> {
    let clinic_id = parse_id(&clinic_id, "clinic")?;
    let conn = ctx.core.open_db()?;
    let mut flow = ctx.core.lock_flow()?;
    let applied = flow.add_clinic(&conn, &clinic_id);
    Ok(Json(ActionResponse::from_flag(flow.step(), applied)))
}

pub async fn remove_clinic(
    State(ctx): State<ApiContext>,
    Path(clinic_id): Path<String>,
) -> Result<Json<ActionResponse<()>>, ApiError> {
    let clinic_id = parse_id(&clinic_id, "clinic")?;
    let conn = ctx.core.open_db()?;
    let mut flow = ctx.core.lock_flow()?;
    let applied = flow.remove_clinic(&conn, &clinic_id);
    Ok(Json(ActionResponse::from_flag(flow.step(), applied)))
}

pub async fn create_provider(
    State(ctx): State<ApiContext>,
    body: Result<Json<NameRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<Provider>>, ApiError> {
    let Json(req) = body?;
    let conn = ctx.core.open_db()?;
    let mut flow = ctx.core.lock_flow()?;
    let created = flow.create_provider(&conn, &req.name);
    Ok(Json(ActionResponse::from_option(flow.step(), created)))
}

/// `GET /api/intake/providers/:id`: provider detail panel.
pub async fn provider_detail(
    State(ctx): State<ApiContext>,
    Path(provider_id): Path<String>,
) -> Result<Json<Provider>, ApiError> {
    let provider_id = parse_id(&provider_id, "provider")?;
    let conn = ctx.core.open_db()?;
    let flow = ctx.core.lock_flow()?;
    ensure_live(&flow)?;
    flow.provider_detail(&conn, &provider_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Provider not found".into()))
}

pub async fn add_provider(
    State(ctx): State<ApiContext>,
    Path(provider_id): Path<String>,
) -> Result<Json<ActionResponse<()>>, ApiError> {
    let provider_id = parse_id(&provider_id, "provider")?;
    let conn = ctx.core.open_db()?;
    let mut flow = ctx.core.lock_flow()?;
    let applied = flow.add_provider(&conn, &provider_id);
    Ok(Json(ActionResponse::from_flag(flow.step(), applied)))
}

pub async fn remove_provider(
    State(ctx): State<ApiContext>,
    Path(provider_id): Path<String>,
) -> Result<Json<ActionResponse<()>>, ApiError> {
    let provider_id = parse_id(&provider_id, "provider")?;
    let conn = ctx.core.open_db()?;
    let mut flow = ctx.core.lock_flow()?;
    let applied = flow.remove_provider(&conn, &provider_id);
    Ok(Json(ActionResponse::from_flag(flow.step(), applied)))
}

/// `POST /api/intake/drug`: store the drug entry and return its estimate.
/// The move to program enrollment happens after the advance delay.
pub async fn submit_drug(
    State(ctx): State<ApiContext>,
    body: Result<Json<DrugRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<DrugPricing>>, ApiError> {
    let Json(req) = body?;
    let conn = ctx.core.open_db()?;
    let (response, delay) = {
        let mut flow = ctx.core.lock_flow()?;
        let pricing = flow.submit_drug(&conn, &req.drug_name, Instant::now());
        let delay = pricing.as_ref().map(|_| flow.timing().advance_delay);
        (ActionResponse::from_option(flow.step(), pricing), delay)
    };

    if let Some(delay) = delay {
        ctx.core.schedule_tick(delay);
    }
    Ok(Json(response))
}
