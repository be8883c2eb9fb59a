//! Catalog item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over the `predefinedItems` collection.
//! - Lazily seed the default catalog on first read of an empty store.
//!
//! # Invariants
//! - Deleting an item never touches tasks; checklist entries keep their
//!   `item_name` snapshot and a dangling `item_id`.
//! - Seeding never reuses ids: fixed ids 1..=5 are only used while the item
//!   sequence is untouched.

use crate::model::item::{Item, ItemId, DEFAULT_ITEMS};
use crate::repo::error::{EntityRef, RepoError, RepoResult};
use crate::repo::kv_store::{
    ensure_store_ready, write_transaction, KvStore, ITEMS_KEY, ITEM_ID_COUNTER_KEY,
};
use crate::repo::sequence::IdSequence;
use chrono::Utc;
use log::{debug, info};
use rusqlite::Connection;

/// Repository interface for catalog items.
pub trait ItemRepository {
    fn create_item(&self, name: &str, description: &str) -> RepoResult<Item>;
    /// Replaces name and description; `NotFound` for unknown ids.
    fn update_item(&self, id: ItemId, name: &str, description: &str) -> RepoResult<Item>;
    /// Removes the item. Unknown ids are a no-op.
    fn delete_item(&self, id: ItemId) -> RepoResult<()>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    /// Returns the catalog, seeding [`DEFAULT_ITEMS`] when it is empty.
    fn get_predefined_items(&self) -> RepoResult<Vec<Item>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, name: &str, description: &str) -> RepoResult<Item> {
        let item = write_transaction(self.conn, |store| {
            let mut items: Vec<Item> = store.load_collection(ITEMS_KEY)?;
            let max_id = items.iter().map(|item| item.id).max();
            let mut ids = IdSequence::load(store, ITEM_ID_COUNTER_KEY, max_id)?;
            let item = Item {
                id: ids.allocate(),
                name: name.to_string(),
                description: description.to_string(),
                created_at: Utc::now(),
                updated_at: None,
            };

            items.push(item.clone());
            store.save_collection(ITEMS_KEY, &items)?;
            ids.persist(store)?;
            Ok(item)
        })?;

        info!("event=item_create module=repo status=ok item_id={}", item.id);
        Ok(item)
    }

    fn update_item(&self, id: ItemId, name: &str, description: &str) -> RepoResult<Item> {
        write_transaction(self.conn, |store| {
            let mut items: Vec<Item> = store.load_collection(ITEMS_KEY)?;
            let item = items
                .iter_mut()
                .find(|item| item.id == id)
                .ok_or(RepoError::NotFound(EntityRef::item(id)))?;
            item.name = name.to_string();
            item.description = description.to_string();
            item.updated_at = Some(Utc::now());
            let updated = item.clone();

            store.save_collection(ITEMS_KEY, &items)?;
            Ok(updated)
        })
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        let removed = write_transaction(self.conn, |store| {
            let mut items: Vec<Item> = store.load_collection(ITEMS_KEY)?;
            let before = items.len();
            items.retain(|item| item.id != id);
            if items.len() == before {
                return Ok(false);
            }
            store.save_collection(ITEMS_KEY, &items)?;
            Ok(true)
        })?;

        debug!("event=item_delete module=repo status=ok item_id={id} removed={removed}");
        Ok(())
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let items: Vec<Item> = KvStore::new(self.conn).load_collection(ITEMS_KEY)?;
        Ok(items.into_iter().find(|item| item.id == id))
    }

    fn get_predefined_items(&self) -> RepoResult<Vec<Item>> {
        write_transaction(self.conn, |store| {
            let items: Vec<Item> = store.load_collection(ITEMS_KEY)?;
            if !items.is_empty() {
                return Ok(items);
            }

            let mut ids = IdSequence::load(store, ITEM_ID_COUNTER_KEY, None)?;
            let fixed_ids = ids.is_fresh();
            let now = Utc::now();
            let seeded = DEFAULT_ITEMS
                .iter()
                .zip(1_i64..)
                .map(|((name, description), fixed_id)| Item {
                    id: if fixed_ids { fixed_id } else { ids.allocate() },
                    name: (*name).to_string(),
                    description: (*description).to_string(),
                    created_at: now,
                    updated_at: None,
                })
                .collect::<Vec<_>>();
            if let Some(last) = seeded.last() {
                ids.observe(last.id);
            }

            store.save_collection(ITEMS_KEY, &seeded)?;
            ids.persist(store)?;
            info!(
                "event=catalog_seed module=repo status=ok items={} next_item_id={}",
                seeded.len(),
                ids.peek()
            );
            Ok(seeded)
        })
    }
}
