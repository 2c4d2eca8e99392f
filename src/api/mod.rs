//! HTTP API for the intake wizard.
//!
//! Each screen action is one endpoint under `/api/`. Handlers lock the
//! shared `IntakeFlow`, run the action and report whether it completed.
//!
//! The router is composable: `intake_api_router()` returns a `Router`
//! that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::intake_api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
