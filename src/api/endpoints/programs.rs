//! Program enrollment screen endpoints.
//!
//! - `GET /api/intake/programs`: programs with the user's enrollment state
//! - `POST /api/intake/programs/:id/enroll`: enroll, then log out after a delay
//! - `POST /api/intake/programs/:id/select`: focus a program
//! - `PUT /api/intake/programs/:id/status`: change status (completed is two-phase)
//! - `POST /api/intake/completion`: commit the pending completed status with a date
//! - `DELETE /api/intake/completion`: discard the pending completed status
//! - `POST /api/intake/programs/:id/complete`: record completion directly

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::ensure_live;
use crate::api::error::ApiError;
use crate::api::types::{parse_id, ActionResponse, ApiContext};
use crate::intake::{ProgramEnrollmentView, StatusChange};
use crate::models::{Enrollment, EnrollmentStatus};

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct SelectResult {
    /// A completion pending for another program was dropped.
    pub discarded: bool,
}

#[derive(Deserialize)]
pub struct CompletionRequest {
    pub completion_date: NaiveDate,
}

pub async fn view(State(ctx): State<ApiContext>) -> Result<Json<ProgramEnrollmentView>, ApiError> {
    let conn = ctx.core.open_db()?;
    let flow = ctx.core.lock_flow()?;
    ensure_live(&flow)?;
    flow.program_enrollment(&conn)
        .map(Json)
        .ok_or_else(|| ApiError::Internal("Failed to load program enrollment".into()))
}

pub async fn enroll(
    State(ctx): State<ApiContext>,
    Path(program_id): Path<String>,
) -> Result<Json<ActionResponse<Enrollment>>, ApiError> {
    let program_id = parse_id(&program_id, "program")?;
    let conn = ctx.core.open_db()?;
    let (response, delay) = {
        let mut flow = ctx.core.lock_flow()?;
        let enrollment = flow.enroll(&conn, &program_id, Instant::now());
        let delay = enrollment.as_ref().map(|_| flow.timing().logout_delay);
        (ActionResponse::from_option(flow.step(), enrollment), delay)
    };

    if let Some(delay) = delay {
        ctx.core.schedule_tick(delay);
    }
    Ok(Json(response))
}

pub async fn select(
    State(ctx): State<ApiContext>,
    Path(program_id): Path<String>,
) -> Result<Json<ActionResponse<SelectResult>>, ApiError> {
    let program_id = parse_id(&program_id, "program")?;
    let mut flow = ctx.core.lock_flow()?;
    let selected = flow
        .select_program(&program_id)
        .map(|discarded| SelectResult { discarded });
    Ok(Json(ActionResponse::from_option(flow.step(), selected)))
}

pub async fn change_status(
    State(ctx): State<ApiContext>,
    Path(program_id): Path<String>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<StatusChange>>, ApiError> {
    let Json(req) = body?;
    let program_id = parse_id(&program_id, "program")?;
    let status: EnrollmentStatus = req
        .status
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown status: {}", req.status)))?;

    let conn = ctx.core.open_db()?;
    let mut flow = ctx.core.lock_flow()?;
    let change = flow.change_status(&conn, &program_id, status);
    Ok(Json(ActionResponse::from_option(flow.step(), change)))
}

pub async fn submit_completion(
    State(ctx): State<ApiContext>,
    body: Result<Json<CompletionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<Enrollment>>, ApiError> {
    let Json(req) = body?;
    let conn = ctx.core.open_db()?;
    let mut flow = ctx.core.lock_flow()?;
    let updated = flow.submit_completion_date(&conn, req.completion_date);
    Ok(Json(ActionResponse::from_option(flow.step(), updated)))
}

pub async fn cancel_completion(
    State(ctx): State<ApiContext>,
) -> Result<Json<ActionResponse<()>>, ApiError> {
    let mut flow = ctx.core.lock_flow()?;
    let had_pending = flow
        .session()
        .and_then(|s| s.pending_completion())
        .is_some();
    flow.cancel_completion();
    Ok(Json(ActionResponse::from_flag(flow.step(), had_pending)))
}

pub async fn quick_complete(
    State(ctx): State<ApiContext>,
    Path(program_id): Path<String>,
    body: Result<Json<CompletionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<Enrollment>>, ApiError> {
    let Json(req) = body?;
    let program_id = parse_id(&program_id, "program")?;
    let conn = ctx.core.open_db()?;
    let mut flow = ctx.core.lock_flow()?;
    let enrollment = flow.quick_complete(&conn, &program_id, req.completion_date);
    Ok(Json(ActionResponse::from_option(flow.step(), enrollment)))
}
