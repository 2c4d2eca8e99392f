use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::DATE_FORMAT;
use crate::db::DatabaseError;
use crate::models::{Enrollment, EnrollmentStatus};

const ENROLLMENT_COLUMNS: &str =
    "id, user_id, program_id, status, completion_date, created_at, updated_at";

/// Row as read from SQLite, before the status column is decoded.
struct EnrollmentRow {
    id: Uuid,
    user_id: Uuid,
    program_id: Uuid,
    status: Option<String>,
    completion_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn enrollment_row(row: &Row<'_>) -> rusqlite::Result<EnrollmentRow> {
    Ok(EnrollmentRow {
        id: super::uuid_column(row, 0)?,
        user_id: super::uuid_column(row, 1)?,
        program_id: super::uuid_column(row, 2)?,
        status: row.get(3)?,
        completion_date: super::date_column(row, 4)?,
        created_at: super::timestamp_column(row, 5)?,
        updated_at: super::timestamp_column(row, 6)?,
    })
}

impl EnrollmentRow {
    fn into_enrollment(self) -> Result<Enrollment, DatabaseError> {
        Ok(Enrollment {
            id: self.id,
            user_id: self.user_id,
            program_id: self.program_id,
            status: EnrollmentStatus::from_column(self.status.as_deref())?,
            completion_date: self.completion_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Inserts a new enrollment. A second row for the same (user, program)
/// fails with `ConstraintViolation`.
pub fn insert_enrollment(conn: &Connection, enrollment: &Enrollment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO enrollments (id, user_id, program_id, status, completion_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            enrollment.id.to_string(),
            enrollment.user_id.to_string(),
            enrollment.program_id.to_string(),
            enrollment.status.as_str(),
            enrollment.completion_date.map(|d| d.format(DATE_FORMAT).to_string()),
            super::timestamp_value(&enrollment.created_at),
            super::timestamp_value(&enrollment.updated_at),
        ],
    )
    .map_err(|e| DatabaseError::from_insert(e, "enrollments"))?;
    Ok(())
}

pub fn find_enrollment(
    conn: &Connection,
    user_id: &Uuid,
    program_id: &Uuid,
) -> Result<Option<Enrollment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = ?1 AND program_id = ?2"
            ),
            params![user_id.to_string(), program_id.to_string()],
            enrollment_row,
        )
        .optional()?;
    row.map(EnrollmentRow::into_enrollment).transpose()
}

/// All enrollments for the user, oldest first.
pub fn list_enrollments(conn: &Connection, user_id: &Uuid) -> Result<Vec<Enrollment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = ?1 ORDER BY created_at ASC"
    ))?;
    let rows = stmt.query_map(params![user_id.to_string()], enrollment_row)?;

    let mut enrollments = Vec::new();
    for row in rows {
        enrollments.push(row?.into_enrollment()?);
    }
    Ok(enrollments)
}

/// Writes status, completion date and `updated_at` for an existing row.
/// Returns the number of rows changed.
pub fn update_enrollment(conn: &Connection, enrollment: &Enrollment) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE enrollments SET status = ?1, completion_date = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            enrollment.status.as_str(),
            enrollment.completion_date.map(|d| d.format(DATE_FORMAT).to_string()),
            super::timestamp_value(&enrollment.updated_at),
            enrollment.id.to_string(),
        ],
    )?;
    Ok(changed)
}
