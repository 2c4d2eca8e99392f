//! Error taxonomy for intake operations.

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum IntakeError {
    /// A required input was empty or malformed.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The row the operation would create already exists.
    #[error("{entity_type} already exists for {key}")]
    Conflict { entity_type: String, key: String },

    #[error("{entity_type} not found: {key}")]
    NotFound { entity_type: String, key: String },

    /// Store failure, passed through as-is.
    #[error("Store error: {0}")]
    Remote(#[from] DatabaseError),
}

impl IntakeError {
    pub fn is_remote(&self) -> bool {
        matches!(self, IntakeError::Remote(_))
    }
}
