//! Shared types for the API layer.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::intake::IntakeStep;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// Result of a wizard action.
///
/// `applied: false` means the action did not complete (no session, wrong
/// screen, validation or store failure) and the screen is unchanged.
#[derive(Debug, Serialize)]
pub struct ActionResponse<T: Serialize> {
    pub applied: bool,
    pub step: Option<IntakeStep>,
    pub result: Option<T>,
}

impl<T: Serialize> ActionResponse<T> {
    pub fn from_option(step: Option<IntakeStep>, result: Option<T>) -> Self {
        Self {
            applied: result.is_some(),
            step,
            result,
        }
    }
}

impl ActionResponse<()> {
    pub fn from_flag(step: Option<IntakeStep>, applied: bool) -> Self {
        Self {
            applied,
            step,
            result: None,
        }
    }
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid {what} ID: {e}")))
}
