//! Shared application state for the HTTP transport.
//!
//! `CoreState` owns the single active `IntakeFlow`. Handlers lock the flow,
//! open a connection with `open_db`, run one flow action and release the
//! lock; nothing is held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use crate::config::IntakeConfig;
use crate::db;
use crate::enrollment::{EnrollmentLifecycle, EnrollmentPortal, LoggingPortal};
use crate::intake::{FlowTiming, IntakeFlow, IntakeSession, IntakeStep, TransitionKind};

pub struct CoreState {
    pub config: IntakeConfig,
    portal: Arc<dyn EnrollmentPortal>,
    flow: Mutex<IntakeFlow>,
}

/// Snapshot of the active session for status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub user_id: Uuid,
    pub step: IntakeStep,
    pub pending: Option<TransitionKind>,
}

impl SessionSummary {
    fn of(session: &IntakeSession) -> Self {
        Self {
            user_id: session.user_id(),
            step: session.step(),
            pending: session.pending().map(|p| p.kind),
        }
    }
}

impl CoreState {
    pub fn new(config: IntakeConfig) -> Self {
        Self::with_portal(config, Arc::new(LoggingPortal))
    }

    pub fn with_portal(config: IntakeConfig, portal: Arc<dyn EnrollmentPortal>) -> Self {
        let flow = build_flow(&config, &portal, None);
        Self {
            config,
            portal,
            flow: Mutex::new(flow),
        }
    }

    /// Open a connection to the intake database.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.config.db_path).map_err(CoreError::Database)
    }

    pub fn lock_flow(&self) -> Result<MutexGuard<'_, IntakeFlow>, CoreError> {
        self.flow.lock().map_err(|_| CoreError::LockPoisoned)
    }

    /// Start a fresh session for `user_id`, replacing any previous one.
    pub fn start_session(&self, user_id: Uuid) -> Result<SessionSummary, CoreError> {
        let session = IntakeSession::new(user_id);
        let summary = SessionSummary::of(&session);
        let mut guard = self.lock_flow()?;
        if let Some(previous) = guard.session() {
            tracing::info!(previous = %previous.user_id(), "Replacing active session");
        }
        *guard = build_flow(&self.config, &self.portal, Some(session));
        tracing::info!(%user_id, "Intake session started");
        Ok(summary)
    }

    pub fn end_session(&self) -> Result<(), CoreError> {
        let mut guard = self.lock_flow()?;
        *guard = build_flow(&self.config, &self.portal, None);
        Ok(())
    }

    pub fn session_summary(&self) -> Result<Option<SessionSummary>, CoreError> {
        Ok(self.lock_flow()?.session().map(SessionSummary::of))
    }

    /// True when a session exists and has not logged out.
    pub fn is_active(&self) -> bool {
        self.lock_flow()
            .map(|flow| matches!(flow.step(), Some(step) if step != IntakeStep::LoggedOut))
            .unwrap_or(false)
    }

    /// Apply any transition that is due now.
    pub fn tick(&self) -> Result<Option<IntakeStep>, CoreError> {
        Ok(self.lock_flow()?.tick(Instant::now()))
    }

    /// Run `tick` once `delay` has elapsed.
    pub fn schedule_tick(self: &Arc<Self>, delay: Duration) {
        let core = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match core.tick() {
                Ok(Some(step)) => tracing::debug!(?step, "Timed transition applied"),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "Timed transition failed"),
            }
        });
    }
}

fn build_flow(
    config: &IntakeConfig,
    portal: &Arc<dyn EnrollmentPortal>,
    session: Option<IntakeSession>,
) -> IntakeFlow {
    let lifecycle = EnrollmentLifecycle::new(Arc::clone(portal), config.portal_url.clone());
    IntakeFlow::new(session, lifecycle, FlowTiming::from(config))
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No active intake session")]
    NoActiveSession,
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}
