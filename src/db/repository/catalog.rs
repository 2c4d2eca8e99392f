use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::DatabaseError;

/// A global, user-independent catalog table with a per-user join table.
///
/// Implemented by `Clinic` and `Provider`; the generic functions below
/// build their SQL from these constants.
pub trait CatalogEntity: Sized {
    /// Display name used in logs and errors.
    const ENTITY: &'static str;
    const TABLE: &'static str;
    const JOIN_TABLE: &'static str;
    /// Foreign-key column in `JOIN_TABLE` pointing at `TABLE.id`.
    const JOIN_COLUMN: &'static str;
    /// Select list, in the order `from_row` reads it.
    const COLUMNS: &'static str;

    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
    /// Fresh catalog row carrying only a name.
    fn named(name: &str) -> Self;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn insert(conn: &Connection, item: &Self) -> Result<(), DatabaseError>;
}

/// Whole catalog, alphabetical by name.
pub fn list_catalog<C: CatalogEntity>(conn: &Connection) -> Result<Vec<C>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY name COLLATE NOCASE ASC, id ASC",
        C::COLUMNS,
        C::TABLE
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| C::from_row(row))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn get_catalog_item<C: CatalogEntity>(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<C>, DatabaseError> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?1", C::COLUMNS, C::TABLE);
    conn.query_row(&sql, params![id.to_string()], |row| C::from_row(row))
        .optional()
        .map_err(DatabaseError::from)
}

/// Catalog ids currently associated with the user.
pub fn list_member_ids<C: CatalogEntity>(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<HashSet<Uuid>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE user_id = ?1",
        C::JOIN_COLUMN,
        C::JOIN_TABLE
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        super::uuid_column(row, 0)
    })?;
    rows.collect::<Result<HashSet<_>, _>>().map_err(DatabaseError::from)
}

pub fn is_member<C: CatalogEntity>(
    conn: &Connection,
    user_id: &Uuid,
    item_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = ?1 AND {} = ?2)",
        C::JOIN_TABLE,
        C::JOIN_COLUMN
    );
    let exists: bool = conn.query_row(
        &sql,
        params![user_id.to_string(), item_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn insert_member<C: CatalogEntity>(
    conn: &Connection,
    user_id: &Uuid,
    item_id: &Uuid,
) -> Result<(), DatabaseError> {
    let sql = format!(
        "INSERT INTO {} (user_id, {}) VALUES (?1, ?2)",
        C::JOIN_TABLE,
        C::JOIN_COLUMN
    );
    conn.execute(&sql, params![user_id.to_string(), item_id.to_string()])
        .map_err(|e| DatabaseError::from_insert(e, C::JOIN_TABLE))?;
    Ok(())
}

/// Returns the number of join rows removed (0 or 1).
pub fn delete_member<C: CatalogEntity>(
    conn: &Connection,
    user_id: &Uuid,
    item_id: &Uuid,
) -> Result<usize, DatabaseError> {
    let sql = format!(
        "DELETE FROM {} WHERE user_id = ?1 AND {} = ?2",
        C::JOIN_TABLE,
        C::JOIN_COLUMN
    );
    let removed = conn.execute(&sql, params![user_id.to_string(), item_id.to_string()])?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Clinic, Provider};

    #[test]
    fn catalog_sorted_case_insensitively() {
        let conn = open_memory_database().unwrap();
        for name in ["westside Family", "Eastgate Health", "Northview"] {
            Clinic::insert(&conn, &Clinic::named(name)).unwrap();
        }

        let names: Vec<String> = list_catalog::<Clinic>(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Eastgate Health", "Northview", "westside Family"]);
    }

    #[test]
    fn get_missing_item_is_none() {
        let conn = open_memory_database().unwrap();
        let found = get_catalog_item::<Provider>(&conn, &Uuid::new_v4()).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn duplicate_join_row_is_constraint_violation() {
        let conn = open_memory_database().unwrap();
        let clinic = Clinic::named("Riverside");
        Clinic::insert(&conn, &clinic).unwrap();
        let user = Uuid::new_v4();

        insert_member::<Clinic>(&conn, &user, &clinic.id).unwrap();
        let err = insert_member::<Clinic>(&conn, &user, &clinic.id).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn join_row_requires_catalog_row() {
        let conn = open_memory_database().unwrap();
        let err = insert_member::<Provider>(&conn, &Uuid::new_v4(), &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn membership_is_scoped_per_user() {
        let conn = open_memory_database().unwrap();
        let clinic = Clinic::named("Lakeside");
        Clinic::insert(&conn, &clinic).unwrap();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        insert_member::<Clinic>(&conn, &alice, &clinic.id).unwrap();

        assert!(is_member::<Clinic>(&conn, &alice, &clinic.id).unwrap());
        assert!(!is_member::<Clinic>(&conn, &bob, &clinic.id).unwrap());
        assert!(list_member_ids::<Clinic>(&conn, &bob).unwrap().is_empty());
        assert_eq!(delete_member::<Clinic>(&conn, &bob, &clinic.id).unwrap(), 0);
        assert_eq!(delete_member::<Clinic>(&conn, &alice, &clinic.id).unwrap(), 1);
    }
}
