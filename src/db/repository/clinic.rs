use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::catalog::CatalogEntity;
use crate::db::DatabaseError;
use crate::models::Clinic;

impl CatalogEntity for Clinic {
    const ENTITY: &'static str = "Clinic";
    const TABLE: &'static str = "clinics";
    const JOIN_TABLE: &'static str = "user_clinics";
    const JOIN_COLUMN: &'static str = "clinic_id";
    const COLUMNS: &'static str = "id, name";

    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn named(name: &str) -> Self {
        Clinic {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Clinic {
            id: super::uuid_column(row, 0)?,
            name: row.get(1)?,
        })
    }

    fn insert(conn: &Connection, item: &Self) -> Result<(), DatabaseError> {
        conn.execute(
            "INSERT INTO clinics (id, name) VALUES (?1, ?2)",
            params![item.id.to_string(), item.name],
        )
        .map_err(|e| DatabaseError::from_insert(e, "clinics"))?;
        Ok(())
    }
}
