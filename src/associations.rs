//! User membership within a shared catalog (clinics, providers).
//!
//! `AssociationSet<C>` only manages join rows plus the "add new" shortcut;
//! the catalog itself is append-only and shared by every user.

use std::collections::HashSet;
use std::marker::PhantomData;

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{
    delete_member, get_catalog_item, insert_member, is_member, list_catalog, list_member_ids,
    CatalogEntity,
};
use crate::error::IntakeError;

pub struct AssociationSet<C> {
    _catalog: PhantomData<fn() -> C>,
}

impl<C: CatalogEntity> AssociationSet<C> {
    pub fn new() -> Self {
        Self {
            _catalog: PhantomData,
        }
    }

    /// Whole catalog, alphabetical by name.
    pub fn list_catalog(&self, conn: &Connection) -> Result<Vec<C>, IntakeError> {
        Ok(list_catalog::<C>(conn)?)
    }

    pub fn get(&self, conn: &Connection, item_id: &Uuid) -> Result<Option<C>, IntakeError> {
        Ok(get_catalog_item::<C>(conn, item_id)?)
    }

    pub fn list_membership(
        &self,
        conn: &Connection,
        user_id: &Uuid,
    ) -> Result<HashSet<Uuid>, IntakeError> {
        Ok(list_member_ids::<C>(conn, user_id)?)
    }

    /// Associates the item with the user. Re-adding a member is a no-op.
    pub fn add(&self, conn: &Connection, user_id: &Uuid, item_id: &Uuid) -> Result<(), IntakeError> {
        if is_member::<C>(conn, user_id, item_id)? {
            tracing::debug!(entity = C::ENTITY, %item_id, "Already associated, skipping add");
            return Ok(());
        }
        if get_catalog_item::<C>(conn, item_id)?.is_none() {
            return Err(IntakeError::NotFound {
                entity_type: C::ENTITY.into(),
                key: item_id.to_string(),
            });
        }
        insert_member::<C>(conn, user_id, item_id)?;
        tracing::info!(entity = C::ENTITY, %user_id, %item_id, "Association added");
        Ok(())
    }

    /// Drops the association if present. Removing a non-member is a no-op.
    pub fn remove(
        &self,
        conn: &Connection,
        user_id: &Uuid,
        item_id: &Uuid,
    ) -> Result<(), IntakeError> {
        let removed = delete_member::<C>(conn, user_id, item_id)?;
        if removed == 0 {
            tracing::debug!(entity = C::ENTITY, %item_id, "Not associated, nothing to remove");
        } else {
            tracing::info!(entity = C::ENTITY, %user_id, %item_id, "Association removed");
        }
        Ok(())
    }

    /// Creates a catalog row named `name` (trimmed) and associates it.
    ///
    /// Not atomic: if the association step fails the new catalog row stays
    /// behind without an owner.
    pub fn create_and_add(
        &self,
        conn: &Connection,
        user_id: &Uuid,
        name: &str,
    ) -> Result<C, IntakeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IntakeError::Validation(format!(
                "{} name is required",
                C::ENTITY
            )));
        }

        let item = C::named(name);
        C::insert(conn, &item)?;
        tracing::info!(entity = C::ENTITY, id = %item.id(), name = item.name(), "Catalog entry created");

        self.add(conn, user_id, &item.id())?;
        Ok(item)
    }
}

impl<C: CatalogEntity> Default for AssociationSet<C> {
    fn default() -> Self {
        Self::new()
    }
}
