//! API endpoint handlers.
//!
//! Each module corresponds to a wizard screen or a standalone lookup.

pub mod details;
pub mod drugs;
pub mod health;
pub mod programs;
pub mod session;

use crate::core_state::CoreError;
use crate::intake::{IntakeFlow, IntakeStep};

/// Views need a session that has not logged out.
pub(crate) fn ensure_live(flow: &IntakeFlow) -> Result<(), CoreError> {
    match flow.step() {
        Some(step) if step != IntakeStep::LoggedOut => Ok(()),
        _ => Err(CoreError::NoActiveSession),
    }
}
