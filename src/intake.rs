//! Intake wizard: patient details → program enrollment → logged out.
//!
//! `IntakeFlow` owns one `IntakeSession` and drives the three screens.
//! Every store or validation failure is logged and swallowed here; callers
//! only see `None` / `false`, meaning the action did not complete and the
//! screen stays where it was.
//!
//! Timed transitions (advance after the pricing display, logout after
//! enrolling) are recorded as a `PendingTransition` and applied by `tick`.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::associations::AssociationSet;
use crate::config::IntakeConfig;
use crate::db::repository::{insert_drug_detail, stored_now};
use crate::enrollment::EnrollmentLifecycle;
use crate::error::IntakeError;
use crate::models::{Clinic, DrugDetail, Enrollment, EnrollmentStatus, Program, Provider};
use crate::pricing::{self, DrugPricing};

// ─── Session state ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    PatientDetails,
    ProgramEnrollment,
    LoggedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Advance,
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransition {
    pub kind: TransitionKind,
    pub due_at: Instant,
}

/// Per-user wizard state. Re-created for every login.
#[derive(Debug, Clone)]
pub struct IntakeSession {
    user_id: Uuid,
    step: IntakeStep,
    pending: Option<PendingTransition>,
    /// Program whose completed status awaits a date.
    pending_completion: Option<Uuid>,
    last_pricing: Option<DrugPricing>,
}

impl IntakeSession {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            step: IntakeStep::PatientDetails,
            pending: None,
            pending_completion: None,
            last_pricing: None,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn step(&self) -> IntakeStep {
        self.step
    }

    pub fn pending(&self) -> Option<PendingTransition> {
        self.pending
    }

    pub fn pending_completion(&self) -> Option<Uuid> {
        self.pending_completion
    }

    pub fn last_pricing(&self) -> Option<&DrugPricing> {
        self.last_pricing.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTiming {
    pub advance_delay: Duration,
    pub logout_delay: Duration,
}

impl From<&IntakeConfig> for FlowTiming {
    fn from(config: &IntakeConfig) -> Self {
        Self {
            advance_delay: config.advance_delay,
            logout_delay: config.logout_delay,
        }
    }
}

// ─── Screen views ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PatientDetailsView {
    pub clinics: Vec<Clinic>,
    pub selected_clinic_ids: Vec<Uuid>,
    pub providers: Vec<Provider>,
    pub selected_provider_ids: Vec<Uuid>,
    pub common_drugs: Vec<&'static str>,
    pub pricing: Option<DrugPricing>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramEntry {
    pub program: Program,
    pub enrollment: Option<Enrollment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramEnrollmentView {
    pub programs: Vec<ProgramEntry>,
    pub enrolled_count: usize,
    pub awaiting_completion_date: Option<Uuid>,
}

/// Outcome of a status change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "enrollment", rename_all = "snake_case")]
pub enum StatusChange {
    Applied(Enrollment),
    /// `completed` chosen; commit with `submit_completion_date`.
    AwaitingCompletionDate,
}

// ─── Flow ─────────────────────────────────────────────────────────────────────

pub struct IntakeFlow {
    session: Option<IntakeSession>,
    clinics: AssociationSet<Clinic>,
    providers: AssociationSet<Provider>,
    lifecycle: EnrollmentLifecycle,
    timing: FlowTiming,
}

/// Log-and-swallow for every flow action.
fn settle<T>(action: &'static str, result: Result<T, IntakeError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) if err.is_remote() => {
            tracing::error!(action, error = %err, "Store call failed");
            None
        }
        Err(err) => {
            tracing::warn!(action, error = %err, "Intake action rejected");
            None
        }
    }
}

impl IntakeFlow {
    pub fn new(
        session: Option<IntakeSession>,
        lifecycle: EnrollmentLifecycle,
        timing: FlowTiming,
    ) -> Self {
        Self {
            session,
            clinics: AssociationSet::new(),
            providers: AssociationSet::new(),
            lifecycle,
            timing,
        }
    }

    pub fn session(&self) -> Option<&IntakeSession> {
        self.session.as_ref()
    }

    pub fn step(&self) -> Option<IntakeStep> {
        self.session.as_ref().map(IntakeSession::step)
    }

    pub fn timing(&self) -> FlowTiming {
        self.timing
    }

    /// User id when a session exists and sits on `step`.
    fn user_on(&self, step: IntakeStep, action: &'static str) -> Option<Uuid> {
        match &self.session {
            Some(session) if session.step == step => Some(session.user_id),
            Some(session) => {
                tracing::debug!(action, current = ?session.step, "Action not available on this screen");
                None
            }
            None => {
                tracing::debug!(action, "No session, ignoring");
                None
            }
        }
    }

    /// User id for read-only views: any live (not logged out) session.
    fn live_user(&self) -> Option<Uuid> {
        self.session
            .as_ref()
            .filter(|s| s.step != IntakeStep::LoggedOut)
            .map(|s| s.user_id)
    }

    fn session_mut(&mut self) -> Option<&mut IntakeSession> {
        self.session.as_mut()
    }

    // ── Patient details ─────────────────────────────────────

    pub fn patient_details(&self, conn: &Connection) -> Option<PatientDetailsView> {
        let user_id = self.live_user()?;
        let load = || -> Result<PatientDetailsView, IntakeError> {
            let mut selected_clinic_ids: Vec<Uuid> =
                self.clinics.list_membership(conn, &user_id)?.into_iter().collect();
            selected_clinic_ids.sort();
            let mut selected_provider_ids: Vec<Uuid> =
                self.providers.list_membership(conn, &user_id)?.into_iter().collect();
            selected_provider_ids.sort();

            Ok(PatientDetailsView {
                clinics: self.clinics.list_catalog(conn)?,
                selected_clinic_ids,
                providers: self.providers.list_catalog(conn)?,
                selected_provider_ids,
                common_drugs: pricing::common_drugs(),
                pricing: self.session.as_ref().and_then(|s| s.last_pricing.clone()),
            })
        };
        settle("load_patient_details", load())
    }

    pub fn add_clinic(&mut self, conn: &Connection, clinic_id: &Uuid) -> bool {
        let Some(user_id) = self.user_on(IntakeStep::PatientDetails, "add_clinic") else {
            return false;
        };
        settle("add_clinic", self.clinics.add(conn, &user_id, clinic_id)).is_some()
    }

    pub fn remove_clinic(&mut self, conn: &Connection, clinic_id: &Uuid) -> bool {
        let Some(user_id) = self.user_on(IntakeStep::PatientDetails, "remove_clinic") else {
            return false;
        };
        settle("remove_clinic", self.clinics.remove(conn, &user_id, clinic_id)).is_some()
    }

    pub fn create_clinic(&mut self, conn: &Connection, name: &str) -> Option<Clinic> {
        let user_id = self.user_on(IntakeStep::PatientDetails, "create_clinic")?;
        settle("create_clinic", self.clinics.create_and_add(conn, &user_id, name))
    }

    pub fn add_provider(&mut self, conn: &Connection, provider_id: &Uuid) -> bool {
        let Some(user_id) = self.user_on(IntakeStep::PatientDetails, "add_provider") else {
            return false;
        };
        settle("add_provider", self.providers.add(conn, &user_id, provider_id)).is_some()
    }

    pub fn remove_provider(&mut self, conn: &Connection, provider_id: &Uuid) -> bool {
        let Some(user_id) = self.user_on(IntakeStep::PatientDetails, "remove_provider") else {
            return false;
        };
        settle("remove_provider", self.providers.remove(conn, &user_id, provider_id)).is_some()
    }

    pub fn create_provider(&mut self, conn: &Connection, name: &str) -> Option<Provider> {
        let user_id = self.user_on(IntakeStep::PatientDetails, "create_provider")?;
        settle("create_provider", self.providers.create_and_add(conn, &user_id, name))
    }

    /// Detail panel for a catalog provider.
    pub fn provider_detail(&self, conn: &Connection, provider_id: &Uuid) -> Option<Provider> {
        self.live_user()?;
        settle("provider_detail", self.providers.get(conn, provider_id)).flatten()
    }

    /// Live estimate while typing; nothing is stored.
    pub fn preview_pricing(drug_name: &str) -> Option<DrugPricing> {
        let trimmed = drug_name.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(pricing::price_for(trimmed))
    }

    /// Stores the drug entry, returns its estimate and schedules the move to
    /// program enrollment.
    pub fn submit_drug(
        &mut self,
        conn: &Connection,
        drug_name: &str,
        now: Instant,
    ) -> Option<DrugPricing> {
        let user_id = self.user_on(IntakeStep::PatientDetails, "submit_drug")?;
        let drug_name = drug_name.trim();
        if drug_name.is_empty() {
            return settle(
                "submit_drug",
                Err(IntakeError::Validation("Drug name is required".into())),
            );
        }

        let detail = DrugDetail {
            id: Uuid::new_v4(),
            user_id,
            drug_name: drug_name.to_string(),
            created_at: stored_now(),
        };
        settle(
            "submit_drug",
            insert_drug_detail(conn, &detail).map_err(IntakeError::from),
        )?;

        let pricing = pricing::price_for(drug_name);
        let due_at = now + self.timing.advance_delay;
        let session = self.session_mut()?;
        session.last_pricing = Some(pricing.clone());
        session.pending = Some(PendingTransition {
            kind: TransitionKind::Advance,
            due_at,
        });
        tracing::info!(%user_id, drug = drug_name, weekly = pricing.weekly, "Drug details saved");
        Some(pricing)
    }

    // ── Timed transitions ───────────────────────────────────

    /// Applies the pending transition if it is due. Returns the new step.
    pub fn tick(&mut self, now: Instant) -> Option<IntakeStep> {
        let session = self.session.as_mut()?;
        let pending = session.pending.filter(|p| p.due_at <= now)?;
        session.pending = None;

        match pending.kind {
            TransitionKind::Advance => {
                if session.step == IntakeStep::PatientDetails {
                    session.step = IntakeStep::ProgramEnrollment;
                    tracing::info!(user_id = %session.user_id, "Advanced to program enrollment");
                }
            }
            TransitionKind::Logout => {
                session.step = IntakeStep::LoggedOut;
                session.pending_completion = None;
                tracing::info!(user_id = %session.user_id, "Session ended after enrollment");
            }
        }
        Some(session.step)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.session.as_ref()?.pending.map(|p| p.due_at)
    }

    // ── Program enrollment ──────────────────────────────────

    pub fn program_enrollment(&self, conn: &Connection) -> Option<ProgramEnrollmentView> {
        let user_id = self.live_user()?;
        let load = || -> Result<ProgramEnrollmentView, IntakeError> {
            let programs = self.lifecycle.list_programs(conn)?;
            let mut enrollments = self.lifecycle.list_enrollments(conn, &user_id)?;

            let entries: Vec<ProgramEntry> = programs
                .into_iter()
                .map(|program| {
                    let enrollment = enrollments
                        .iter()
                        .position(|e| e.program_id == program.id)
                        .map(|idx| enrollments.swap_remove(idx));
                    ProgramEntry {
                        program,
                        enrollment,
                    }
                })
                .collect();
            let enrolled_count = entries.iter().filter(|e| e.enrollment.is_some()).count();

            Ok(ProgramEnrollmentView {
                programs: entries,
                enrolled_count,
                awaiting_completion_date: self
                    .session
                    .as_ref()
                    .and_then(|s| s.pending_completion),
            })
        };
        settle("load_program_enrollment", load())
    }

    /// Enrolls and schedules the end of the session.
    pub fn enroll(&mut self, conn: &Connection, program_id: &Uuid, now: Instant) -> Option<Enrollment> {
        let user_id = self.user_on(IntakeStep::ProgramEnrollment, "enroll")?;
        let enrollment = settle("enroll", self.lifecycle.enroll(conn, &user_id, program_id))?;

        let due_at = now + self.timing.logout_delay;
        let session = self.session_mut()?;
        session.pending_completion = None;
        session.pending = Some(PendingTransition {
            kind: TransitionKind::Logout,
            due_at,
        });
        Some(enrollment)
    }

    /// First phase of a status change. `completed` only records the intent;
    /// every other status is written immediately.
    pub fn change_status(
        &mut self,
        conn: &Connection,
        program_id: &Uuid,
        status: EnrollmentStatus,
    ) -> Option<StatusChange> {
        let user_id = self.user_on(IntakeStep::ProgramEnrollment, "change_status")?;

        if status == EnrollmentStatus::Completed {
            let existing = settle(
                "change_status",
                self.lifecycle.find(conn, &user_id, program_id),
            )?;
            if existing.is_none() {
                return settle(
                    "change_status",
                    Err(IntakeError::NotFound {
                        entity_type: "Enrollment".into(),
                        key: program_id.to_string(),
                    }),
                );
            }
            self.session_mut()?.pending_completion = Some(*program_id);
            return Some(StatusChange::AwaitingCompletionDate);
        }

        let updated = settle(
            "change_status",
            self.lifecycle
                .set_status(conn, &user_id, program_id, status, None),
        )?;
        self.session_mut()?.pending_completion = None;
        Some(StatusChange::Applied(updated))
    }

    /// Second phase of `change_status(completed)`.
    pub fn submit_completion_date(&mut self, conn: &Connection, date: NaiveDate) -> Option<Enrollment> {
        let user_id = self.user_on(IntakeStep::ProgramEnrollment, "submit_completion_date")?;
        let Some(program_id) = self.session.as_ref().and_then(|s| s.pending_completion) else {
            tracing::debug!("No completion awaiting a date");
            return None;
        };

        let updated = settle(
            "submit_completion_date",
            self.lifecycle.set_status(
                conn,
                &user_id,
                &program_id,
                EnrollmentStatus::Completed,
                Some(date),
            ),
        )?;
        self.session_mut()?.pending_completion = None;
        Some(updated)
    }

    pub fn cancel_completion(&mut self) {
        if let Some(session) = self.session_mut() {
            session.pending_completion = None;
        }
    }

    /// Focus moves to `program_id`; a completion pending for any other
    /// program is discarded. `Some(discarded)` when on the enrollment screen.
    pub fn select_program(&mut self, program_id: &Uuid) -> Option<bool> {
        self.user_on(IntakeStep::ProgramEnrollment, "select_program")?;
        let session = self.session_mut()?;
        match session.pending_completion {
            Some(pending) if pending != *program_id => {
                session.pending_completion = None;
                tracing::debug!(%pending, selected = %program_id, "Pending completion discarded");
                Some(true)
            }
            _ => Some(false),
        }
    }

    /// Records a program as completed without going through enrollment.
    pub fn quick_complete(
        &mut self,
        conn: &Connection,
        program_id: &Uuid,
        date: NaiveDate,
    ) -> Option<Enrollment> {
        let user_id = self.user_on(IntakeStep::ProgramEnrollment, "quick_complete")?;
        let enrollment = settle(
            "quick_complete",
            self.lifecycle.completed_on(conn, &user_id, program_id, date),
        )?;
        self.session_mut()?.pending_completion = None;
        Some(enrollment)
    }

    /// Ends the session now. Returns false if there was nothing to end.
    pub fn logout(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) if session.step != IntakeStep::LoggedOut => {
                session.step = IntakeStep::LoggedOut;
                session.pending = None;
                session.pending_completion = None;
                tracing::info!(user_id = %session.user_id, "Logged out");
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::repository::{list_drug_details, CatalogEntity};
    use crate::db::sqlite::open_memory_database;
    use crate::enrollment::tests::{seed_program, RecordingPortal};

    const ADVANCE: Duration = Duration::from_millis(2000);
    const LOGOUT: Duration = Duration::from_millis(1000);

    fn flow_for(user_id: Option<Uuid>) -> (IntakeFlow, Arc<RecordingPortal>) {
        let portal = Arc::new(RecordingPortal::default());
        let lifecycle = EnrollmentLifecycle::new(portal.clone(), "https://portal.test/register");
        let flow = IntakeFlow::new(
            user_id.map(IntakeSession::new),
            lifecycle,
            FlowTiming {
                advance_delay: ADVANCE,
                logout_delay: LOGOUT,
            },
        );
        (flow, portal)
    }

    /// Flow already on the enrollment screen.
    fn enrollment_flow(conn: &Connection) -> (IntakeFlow, Arc<RecordingPortal>, Uuid) {
        let user = Uuid::new_v4();
        let (mut flow, portal) = flow_for(Some(user));
        let start = Instant::now();
        flow.submit_drug(conn, "Aspirin", start).unwrap();
        flow.tick(start + ADVANCE);
        assert_eq!(flow.step(), Some(IntakeStep::ProgramEnrollment));
        (flow, portal, user)
    }

    #[test]
    fn new_user_metformin_scenario() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let (mut flow, _portal) = flow_for(Some(user));

        let details = flow.patient_details(&conn).unwrap();
        assert!(details.selected_clinic_ids.is_empty());
        assert!(details.selected_provider_ids.is_empty());
        assert!(details.pricing.is_none());

        let start = Instant::now();
        let pricing = flow.submit_drug(&conn, "Metformin", start).unwrap();
        assert_eq!((pricing.weekly, pricing.monthly, pricing.yearly), (15, 60, 600));

        // still showing the estimate until the delay elapses
        assert_eq!(flow.tick(start + ADVANCE / 2), None);
        assert_eq!(flow.step(), Some(IntakeStep::PatientDetails));

        assert_eq!(flow.tick(start + ADVANCE), Some(IntakeStep::ProgramEnrollment));
        let view = flow.program_enrollment(&conn).unwrap();
        assert_eq!(view.enrolled_count, 0);

        let stored = list_drug_details(&conn, &user).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].drug_name, "Metformin");
    }

    #[test]
    fn operations_without_session_are_noops() {
        let conn = open_memory_database().unwrap();
        let (mut flow, portal) = flow_for(None);
        let clinic = Clinic::named("Harbor");
        Clinic::insert(&conn, &clinic).unwrap();
        let program = seed_program(&conn, "Copay Card");

        assert!(flow.patient_details(&conn).is_none());
        assert!(!flow.add_clinic(&conn, &clinic.id));
        assert!(flow.create_provider(&conn, "Dr. Who").is_none());
        assert!(flow.submit_drug(&conn, "Aspirin", Instant::now()).is_none());
        assert!(flow.enroll(&conn, &program.id, Instant::now()).is_none());
        assert!(flow.tick(Instant::now()).is_none());
        assert!(!flow.logout());

        assert!(list_drug_details(&conn, &Uuid::nil()).unwrap().is_empty());
        assert!(portal.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn associations_managed_on_details_screen() {
        let conn = open_memory_database().unwrap();
        let (mut flow, _portal) = flow_for(Some(Uuid::new_v4()));
        let clinic = Clinic::named("Harbor");
        Clinic::insert(&conn, &clinic).unwrap();

        assert!(flow.add_clinic(&conn, &clinic.id));
        assert!(flow.add_clinic(&conn, &clinic.id));
        let provider = flow.create_provider(&conn, " Dr. Reyes ").unwrap();

        let details = flow.patient_details(&conn).unwrap();
        assert_eq!(details.selected_clinic_ids, vec![clinic.id]);
        assert_eq!(details.selected_provider_ids, vec![provider.id]);
        assert_eq!(details.common_drugs.len(), 10);

        assert!(flow.remove_clinic(&conn, &clinic.id));
        assert!(flow.remove_clinic(&conn, &clinic.id));
        assert!(flow.patient_details(&conn).unwrap().selected_clinic_ids.is_empty());

        assert_eq!(
            flow.provider_detail(&conn, &provider.id).map(|p| p.name),
            Some("Dr. Reyes".to_string())
        );
    }

    #[test]
    fn blank_inputs_do_not_complete() {
        let conn = open_memory_database().unwrap();
        let (mut flow, _portal) = flow_for(Some(Uuid::new_v4()));

        assert!(flow.create_clinic(&conn, "  ").is_none());
        assert!(flow.submit_drug(&conn, "   ", Instant::now()).is_none());
        assert!(flow.session().unwrap().pending().is_none());
        assert!(IntakeFlow::preview_pricing(" ").is_none());
        assert_eq!(
            IntakeFlow::preview_pricing(" lisinopril ").map(|p| p.monthly),
            Some(45)
        );
    }

    #[test]
    fn unknown_clinic_does_not_complete() {
        let conn = open_memory_database().unwrap();
        let (mut flow, _portal) = flow_for(Some(Uuid::new_v4()));
        assert!(!flow.add_clinic(&conn, &Uuid::new_v4()));
    }

    #[test]
    fn enrollment_actions_unavailable_on_details_screen() {
        let conn = open_memory_database().unwrap();
        let (mut flow, portal) = flow_for(Some(Uuid::new_v4()));
        let program = seed_program(&conn, "Copay Card");

        assert!(flow.enroll(&conn, &program.id, Instant::now()).is_none());
        assert!(portal.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn enroll_then_logout_after_delay() {
        let conn = open_memory_database().unwrap();
        let (mut flow, portal, _user) = enrollment_flow(&conn);
        let program = seed_program(&conn, "Copay Card");

        let start = Instant::now();
        let enrollment = flow.enroll(&conn, &program.id, start).unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);
        assert_eq!(portal.opened.lock().unwrap().len(), 1);
        assert_eq!(flow.next_due(), Some(start + LOGOUT));

        let view = flow.program_enrollment(&conn).unwrap();
        assert_eq!(view.enrolled_count, 1);

        assert_eq!(flow.tick(start + LOGOUT), Some(IntakeStep::LoggedOut));
        assert!(flow.program_enrollment(&conn).is_none());
        assert!(flow.enroll(&conn, &program.id, Instant::now()).is_none());
    }

    #[test]
    fn second_enroll_does_not_complete() {
        let conn = open_memory_database().unwrap();
        let (mut flow, portal, _user) = enrollment_flow(&conn);
        let program = seed_program(&conn, "Copay Card");

        flow.enroll(&conn, &program.id, Instant::now()).unwrap();
        assert!(flow.enroll(&conn, &program.id, Instant::now()).is_none());
        assert_eq!(portal.opened.lock().unwrap().len(), 1);
    }

    #[test]
    fn completion_is_two_phase() {
        let conn = open_memory_database().unwrap();
        let (mut flow, _portal, user) = enrollment_flow(&conn);
        let program = seed_program(&conn, "Copay Card");
        flow.enroll(&conn, &program.id, Instant::now()).unwrap();

        let change = flow
            .change_status(&conn, &program.id, EnrollmentStatus::Completed)
            .unwrap();
        assert_eq!(change, StatusChange::AwaitingCompletionDate);
        assert_eq!(
            flow.program_enrollment(&conn).unwrap().awaiting_completion_date,
            Some(program.id)
        );

        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let done = flow.submit_completion_date(&conn, date).unwrap();
        assert_eq!(done.status, EnrollmentStatus::Completed);
        assert_eq!(done.completion_date, Some(date));
        assert_eq!(done.user_id, user);

        // nothing left pending
        assert!(flow.submit_completion_date(&conn, date).is_none());
    }

    #[test]
    fn completed_without_enrollment_needs_quick_complete() {
        let conn = open_memory_database().unwrap();
        let (mut flow, _portal, _user) = enrollment_flow(&conn);
        let program = seed_program(&conn, "Copay Card");
        let date = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();

        assert!(flow
            .change_status(&conn, &program.id, EnrollmentStatus::Completed)
            .is_none());
        assert!(flow
            .change_status(&conn, &program.id, EnrollmentStatus::Ongoing)
            .is_none());

        let done = flow.quick_complete(&conn, &program.id, date).unwrap();
        assert_eq!(done.status, EnrollmentStatus::Completed);
        // quick complete does not end the session
        assert_eq!(flow.step(), Some(IntakeStep::ProgramEnrollment));
    }

    #[test]
    fn other_statuses_apply_immediately() {
        let conn = open_memory_database().unwrap();
        let (mut flow, _portal, _user) = enrollment_flow(&conn);
        let program = seed_program(&conn, "Copay Card");
        flow.enroll(&conn, &program.id, Instant::now()).unwrap();

        flow.change_status(&conn, &program.id, EnrollmentStatus::Completed)
            .unwrap();
        let change = flow
            .change_status(&conn, &program.id, EnrollmentStatus::Rejected)
            .unwrap();
        match change {
            StatusChange::Applied(e) => assert_eq!(e.status, EnrollmentStatus::Rejected),
            other => panic!("unexpected {other:?}"),
        }
        // switching away discards the pending completion
        assert!(flow.session().unwrap().pending_completion().is_none());
    }

    #[test]
    fn selecting_another_program_discards_pending_completion() {
        let conn = open_memory_database().unwrap();
        let (mut flow, _portal, _user) = enrollment_flow(&conn);
        let first = seed_program(&conn, "Copay Card");
        let second = seed_program(&conn, "Rx Outreach");
        flow.enroll(&conn, &first.id, Instant::now()).unwrap();
        flow.change_status(&conn, &first.id, EnrollmentStatus::Completed)
            .unwrap();

        assert_eq!(flow.select_program(&first.id), Some(false));
        assert_eq!(flow.session().unwrap().pending_completion(), Some(first.id));

        assert_eq!(flow.select_program(&second.id), Some(true));
        assert!(flow.session().unwrap().pending_completion().is_none());
        let date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert!(flow.submit_completion_date(&conn, date).is_none());
    }

    #[test]
    fn explicit_logout_ends_session() {
        let conn = open_memory_database().unwrap();
        let (mut flow, _portal) = flow_for(Some(Uuid::new_v4()));
        let start = Instant::now();
        flow.submit_drug(&conn, "Ibuprofen", start).unwrap();

        assert!(flow.logout());
        assert_eq!(flow.step(), Some(IntakeStep::LoggedOut));
        // pending advance is dropped
        assert_eq!(flow.tick(start + ADVANCE), None);
        assert!(!flow.logout());
        assert!(flow.patient_details(&conn).is_none());
    }

    #[test]
    fn resubmitting_drug_appends_and_reschedules() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let (mut flow, _portal) = flow_for(Some(user));
        let start = Instant::now();

        flow.submit_drug(&conn, "Aspirin", start).unwrap();
        let later = start + Duration::from_millis(500);
        flow.submit_drug(&conn, "Losartan", later).unwrap();

        assert_eq!(flow.next_due(), Some(later + ADVANCE));
        assert_eq!(list_drug_details(&conn, &user).unwrap().len(), 2);
        assert_eq!(
            flow.patient_details(&conn).unwrap().pricing.map(|p| p.yearly),
            Some(700)
        );
    }
}
