//! Key-value collection store on top of the `kv_entries` table.
//!
//! # Responsibility
//! - Read and write whole collections as JSON arrays under fixed keys.
//! - Read and write id counters as stringified integers.
//! - Run one logical operation per SQLite transaction.
//!
//! # Invariants
//! - A missing key reads as an empty collection / absent counter.
//! - Undecodable values surface as `RepoError::InvalidData`, never as empty.
//! - Writes overwrite the full value stored under a key.

use crate::db::DbError;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const USERS_KEY: &str = "users";
pub const TASKS_KEY: &str = "tasks";
pub const ITEMS_KEY: &str = "predefinedItems";
pub const TASK_ITEM_UPDATES_KEY: &str = "taskItemUpdates";

pub const USER_ID_COUNTER_KEY: &str = "userIdCounter";
pub const TASK_ID_COUNTER_KEY: &str = "taskIdCounter";
pub const ITEM_ID_COUNTER_KEY: &str = "itemIdCounter";

const KV_TABLE: &str = "kv_entries";

/// Typed view over `kv_entries` bound to one connection or transaction.
pub struct KvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> KvStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns the raw stored string for `key`.
    pub fn get_raw(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Inserts or overwrites the raw value for `key`.
    pub fn put_raw(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    /// Decodes the JSON array stored under `key`.
    pub fn load_collection<T: DeserializeOwned>(&self, key: &str) -> RepoResult<Vec<T>> {
        match self.get_raw(key)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|err| {
                RepoError::InvalidData(format!("collection `{key}` is not a valid array: {err}"))
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Serializes `records` and overwrites the collection under `key`.
    pub fn save_collection<T: Serialize>(&self, key: &str, records: &[T]) -> RepoResult<()> {
        let raw = serde_json::to_string(records).map_err(|err| {
            RepoError::InvalidData(format!("collection `{key}` cannot be serialized: {err}"))
        })?;
        self.put_raw(key, &raw)
    }

    pub fn load_counter(&self, key: &str) -> RepoResult<Option<i64>> {
        match self.get_raw(key)? {
            Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| {
                RepoError::InvalidData(format!("counter `{key}` holds non-integer `{raw}`"))
            }),
            None => Ok(None),
        }
    }

    pub fn save_counter(&self, key: &str, value: i64) -> RepoResult<()> {
        self.put_raw(key, &value.to_string())
    }
}

/// Runs `op` inside an immediate transaction, committing only on `Ok`.
///
/// Each repository mutation goes through here so a logical operation either
/// fully applies or leaves every collection untouched.
pub fn write_transaction<T>(
    conn: &Connection,
    op: impl FnOnce(&KvStore<'_>) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = op(&KvStore::new(&tx))?;
    tx.commit()?;
    Ok(value)
}

/// Rejects connections that were not bootstrapped through `open_db`.
pub fn ensure_store_ready(conn: &Connection) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [KV_TABLE],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(DbError::MissingRequiredTable(KV_TABLE).into())
    }
}
