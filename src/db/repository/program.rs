use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Program;

const PROGRAM_COLUMNS: &str = "id, name, sponsor, monetary_cap, description, enrollment_link";

fn program_from_row(row: &Row<'_>) -> rusqlite::Result<Program> {
    Ok(Program {
        id: super::uuid_column(row, 0)?,
        name: row.get(1)?,
        sponsor: row.get(2)?,
        monetary_cap: row.get(3)?,
        description: row.get(4)?,
        enrollment_link: row.get(5)?,
    })
}

pub fn insert_program(conn: &Connection, program: &Program) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO programs (id, name, sponsor, monetary_cap, description, enrollment_link)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            program.id.to_string(),
            program.name,
            program.sponsor,
            program.monetary_cap,
            program.description,
            program.enrollment_link,
        ],
    )
    .map_err(|e| DatabaseError::from_insert(e, "programs"))?;
    Ok(())
}

/// Lists the program catalog ordered by name.
pub fn list_programs(conn: &Connection) -> Result<Vec<Program>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROGRAM_COLUMNS} FROM programs ORDER BY name COLLATE NOCASE ASC, id ASC"
    ))?;
    let rows = stmt.query_map([], program_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn get_program(conn: &Connection, id: &Uuid) -> Result<Option<Program>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE id = ?1"),
        params![id.to_string()],
        program_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn program(name: &str) -> Program {
        Program {
            id: Uuid::new_v4(),
            name: name.into(),
            sponsor: "Sponsor".into(),
            monetary_cap: "$5,000".into(),
            description: "Copay assistance".into(),
            enrollment_link: "https://example.org/enroll".into(),
        }
    }

    #[test]
    fn programs_listed_by_name() {
        let conn = open_memory_database().unwrap();
        insert_program(&conn, &program("Zeta Assist")).unwrap();
        insert_program(&conn, &program("alpha Care")).unwrap();

        let names: Vec<String> = list_programs(&conn)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .filter(|name| name == "alpha Care" || name == "Zeta Assist")
            .collect();
        assert_eq!(names, vec!["alpha Care", "Zeta Assist"]);
    }

    #[test]
    fn get_program_round_trip() {
        let conn = open_memory_database().unwrap();
        let p = program("Heart Fund");
        insert_program(&conn, &p).unwrap();

        assert_eq!(get_program(&conn, &p.id).unwrap(), Some(p));
        assert_eq!(get_program(&conn, &Uuid::new_v4()).unwrap(), None);
    }
}
