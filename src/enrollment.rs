//! Program enrollment lifecycle.
//!
//! One row per (user, program). States:
//!
//! ```text
//! (none) ──enroll──▶ enrolled ──▶ ongoing / completed / rejected
//! (none) ──completed_on──▶ completed
//! ```
//!
//! Once a row exists its status may be overwritten freely; the lifecycle does
//! not police transitions (completed → ongoing is allowed). Rejection is
//! stored as the literal `rejected`.

use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{
    find_enrollment, get_program, insert_enrollment, list_enrollments, list_programs,
    stored_now, update_enrollment,
};
use crate::db::DatabaseError;
use crate::error::IntakeError;
use crate::models::{Enrollment, EnrollmentStatus, Program};

/// External enrollment portal. Fire-and-forget: no response is consumed.
pub trait EnrollmentPortal: Send + Sync {
    fn open(&self, url: &str);
}

/// Default portal: records the hand-off in the log.
#[derive(Debug, Default)]
pub struct LoggingPortal;

impl EnrollmentPortal for LoggingPortal {
    fn open(&self, url: &str) {
        tracing::info!(url, "Opening enrollment portal");
    }
}

pub struct EnrollmentLifecycle {
    portal: Arc<dyn EnrollmentPortal>,
    portal_url: String,
}

impl EnrollmentLifecycle {
    pub fn new(portal: Arc<dyn EnrollmentPortal>, portal_url: impl Into<String>) -> Self {
        Self {
            portal,
            portal_url: portal_url.into(),
        }
    }

    pub fn list_programs(&self, conn: &Connection) -> Result<Vec<Program>, IntakeError> {
        Ok(list_programs(conn)?)
    }

    pub fn list_enrollments(
        &self,
        conn: &Connection,
        user_id: &Uuid,
    ) -> Result<Vec<Enrollment>, IntakeError> {
        Ok(list_enrollments(conn, user_id)?)
    }

    pub fn find(
        &self,
        conn: &Connection,
        user_id: &Uuid,
        program_id: &Uuid,
    ) -> Result<Option<Enrollment>, IntakeError> {
        Ok(find_enrollment(conn, user_id, program_id)?)
    }

    /// Creates the enrollment with status `enrolled` and hands off to the
    /// external portal.
    pub fn enroll(
        &self,
        conn: &Connection,
        user_id: &Uuid,
        program_id: &Uuid,
    ) -> Result<Enrollment, IntakeError> {
        require_program(conn, program_id)?;
        if find_enrollment(conn, user_id, program_id)?.is_some() {
            return Err(conflict(user_id, program_id));
        }

        let enrollment = new_enrollment(*user_id, *program_id, EnrollmentStatus::Enrolled, None);
        create(conn, &enrollment)?;
        tracing::info!(%user_id, %program_id, "Enrolled in program");

        self.portal.open(&self.portal_url);
        Ok(enrollment)
    }

    /// Overwrites the status of an existing enrollment.
    ///
    /// `completed` requires `completion_date`; for any other status the date
    /// argument is ignored and a stored date is left as it was.
    pub fn set_status(
        &self,
        conn: &Connection,
        user_id: &Uuid,
        program_id: &Uuid,
        status: EnrollmentStatus,
        completion_date: Option<NaiveDate>,
    ) -> Result<Enrollment, IntakeError> {
        let mut enrollment =
            find_enrollment(conn, user_id, program_id)?.ok_or_else(|| IntakeError::NotFound {
                entity_type: "Enrollment".into(),
                key: pair_key(user_id, program_id),
            })?;

        if status == EnrollmentStatus::Completed {
            let date = completion_date.ok_or_else(|| {
                IntakeError::Validation("Completion date is required".into())
            })?;
            enrollment.completion_date = Some(date);
        }

        let previous = enrollment.status;
        enrollment.status = status;
        enrollment.updated_at = stored_now();
        update_enrollment(conn, &enrollment)?;

        tracing::info!(
            %user_id,
            %program_id,
            from = previous.as_str(),
            to = status.as_str(),
            "Enrollment status updated"
        );
        Ok(enrollment)
    }

    /// Marks the program completed on `date`, creating the enrollment if the
    /// user never enrolled through the portal.
    pub fn completed_on(
        &self,
        conn: &Connection,
        user_id: &Uuid,
        program_id: &Uuid,
        date: NaiveDate,
    ) -> Result<Enrollment, IntakeError> {
        if find_enrollment(conn, user_id, program_id)?.is_some() {
            return self.set_status(
                conn,
                user_id,
                program_id,
                EnrollmentStatus::Completed,
                Some(date),
            );
        }

        require_program(conn, program_id)?;
        let enrollment =
            new_enrollment(*user_id, *program_id, EnrollmentStatus::Completed, Some(date));
        create(conn, &enrollment)?;
        tracing::info!(%user_id, %program_id, %date, "Program recorded as completed");
        Ok(enrollment)
    }
}

fn new_enrollment(
    user_id: Uuid,
    program_id: Uuid,
    status: EnrollmentStatus,
    completion_date: Option<NaiveDate>,
) -> Enrollment {
    let now = stored_now();
    Enrollment {
        id: Uuid::new_v4(),
        user_id,
        program_id,
        status,
        completion_date,
        created_at: now,
        updated_at: now,
    }
}

/// Insert, mapping a lost race on the unique (user, program) index to a conflict.
fn create(conn: &Connection, enrollment: &Enrollment) -> Result<(), IntakeError> {
    match insert_enrollment(conn, enrollment) {
        Ok(()) => Ok(()),
        Err(DatabaseError::ConstraintViolation(_)) => {
            Err(conflict(&enrollment.user_id, &enrollment.program_id))
        }
        Err(e) => Err(e.into()),
    }
}

fn require_program(conn: &Connection, program_id: &Uuid) -> Result<Program, IntakeError> {
    get_program(conn, program_id)?.ok_or_else(|| IntakeError::NotFound {
        entity_type: "Program".into(),
        key: program_id.to_string(),
    })
}

fn conflict(user_id: &Uuid, program_id: &Uuid) -> IntakeError {
    IntakeError::Conflict {
        entity_type: "Enrollment".into(),
        key: pair_key(user_id, program_id),
    }
}

fn pair_key(user_id: &Uuid, program_id: &Uuid) -> String {
    format!("user {user_id} / program {program_id}")
}
