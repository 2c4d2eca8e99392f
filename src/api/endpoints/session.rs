//! Session endpoints.
//!
//! - `GET /api/session`: current session, if any
//! - `POST /api/session`: log a user in (replaces any active session)
//! - `DELETE /api/session`: drop the session entirely
//! - `POST /api/intake/logout`: end the session from the wizard

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ActionResponse, ApiContext};
use crate::core_state::SessionSummary;

#[derive(Serialize)]
pub struct SessionResponse {
    pub session: Option<SessionSummary>,
}

#[derive(Deserialize)]
pub struct StartSessionRequest {
    pub user_id: Uuid,
}

pub async fn current(State(ctx): State<ApiContext>) -> Result<Json<SessionResponse>, ApiError> {
    Ok(Json(SessionResponse {
        session: ctx.core.session_summary()?,
    }))
}

pub async fn start(
    State(ctx): State<ApiContext>,
    body: Result<Json<StartSessionRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(req) = body?;
    let summary = ctx.core.start_session(req.user_id)?;
    Ok(Json(SessionResponse {
        session: Some(summary),
    }))
}

pub async fn end(State(ctx): State<ApiContext>) -> Result<Json<SessionResponse>, ApiError> {
    ctx.core.end_session()?;
    Ok(Json(SessionResponse { session: None }))
}

pub async fn logout(State(ctx): State<ApiContext>) -> Result<Json<ActionResponse<()>>, ApiError> {
    let mut flow = ctx.core.lock_flow()?;
    let applied = flow.logout();
    Ok(Json(ActionResponse::from_flag(flow.step(), applied)))
}
