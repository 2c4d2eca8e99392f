use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::DrugDetail;

/// Appends a drug entry. No deduplication.
pub fn insert_drug_detail(conn: &Connection, detail: &DrugDetail) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO drug_details (id, user_id, drug_name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            detail.id.to_string(),
            detail.user_id.to_string(),
            detail.drug_name,
            super::timestamp_value(&detail.created_at),
        ],
    )?;
    Ok(())
}

pub fn list_drug_details(conn: &Connection, user_id: &Uuid) -> Result<Vec<DrugDetail>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, drug_name, created_at FROM drug_details
         WHERE user_id = ?1 ORDER BY created_at ASC",
    )?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok(DrugDetail {
            id: super::uuid_column(row, 0)?,
            user_id: super::uuid_column(row, 1)?,
            drug_name: row.get(2)?,
            created_at: super::timestamp_column(row, 3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::Utc;

    #[test]
    fn repeated_entries_are_all_kept() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        for _ in 0..2 {
            insert_drug_detail(
                &conn,
                &DrugDetail {
                    id: Uuid::new_v4(),
                    user_id: user,
                    drug_name: "Metformin".into(),
                    created_at: Utc::now(),
                },
            )
            .unwrap();
        }

        let details = list_drug_details(&conn, &user).unwrap();
        assert_eq!(details.len(), 2);
        assert!(details.iter().all(|d| d.drug_name == "Metformin"));
    }
}
