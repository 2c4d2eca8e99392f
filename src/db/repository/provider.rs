use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::catalog::CatalogEntity;
use crate::db::DatabaseError;
use crate::models::Provider;

impl CatalogEntity for Provider {
    const ENTITY: &'static str = "Provider";
    const TABLE: &'static str = "providers";
    const JOIN_TABLE: &'static str = "user_providers";
    const JOIN_COLUMN: &'static str = "provider_id";
    const COLUMNS: &'static str =
        "id, name, specialty, contact_email, contact_phone, address, npi_number";

    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn named(name: &str) -> Self {
        Provider {
            id: Uuid::new_v4(),
            name: name.to_string(),
            specialty: None,
            contact_email: None,
            contact_phone: None,
            address: None,
            npi_number: None,
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Provider {
            id: super::uuid_column(row, 0)?,
            name: row.get(1)?,
            specialty: row.get(2)?,
            contact_email: row.get(3)?,
            contact_phone: row.get(4)?,
            address: row.get(5)?,
            npi_number: row.get(6)?,
        })
    }

    fn insert(conn: &Connection, item: &Self) -> Result<(), DatabaseError> {
        conn.execute(
            "INSERT INTO providers (id, name, specialty, contact_email, contact_phone, address, npi_number)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.id.to_string(),
                item.name,
                item.specialty,
                item.contact_email,
                item.contact_phone,
                item.address,
                item.npi_number,
            ],
        )
        .map_err(|e| DatabaseError::from_insert(e, "providers"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::get_catalog_item;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn optional_fields_survive_storage() {
        let conn = open_memory_database().unwrap();
        let provider = Provider {
            specialty: Some("Endocrinology".into()),
            contact_email: Some("office@example.org".into()),
            npi_number: Some("1234567893".into()),
            ..Provider::named("Dr. Okafor")
        };
        Provider::insert(&conn, &provider).unwrap();

        let stored = get_catalog_item::<Provider>(&conn, &provider.id)
            .unwrap()
            .unwrap();
        assert_eq!(stored, provider);
        assert!(stored.contact_phone.is_none());
        assert!(stored.address.is_none());
    }
}
