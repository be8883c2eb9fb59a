//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Emails are unique; a conflicting create persists nothing.
//! - Users are never deleted, so user ids never dangle.

use crate::model::user::{User, UserId, UserRole};
use crate::repo::error::{DuplicateKey, RepoError, RepoResult};
use crate::repo::kv_store::{
    ensure_store_ready, write_transaction, KvStore, USERS_KEY, USER_ID_COUNTER_KEY,
};
use crate::repo::sequence::IdSequence;
use chrono::Utc;
use log::{info, warn};
use rusqlite::Connection;

/// Repository interface for account records.
pub trait UserRepository {
    /// Stores a new account with an already-hashed password.
    fn create_user(&self, email: &str, password_hash: &str, role: UserRole) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn get_all_users(&self) -> RepoResult<Vec<User>>;
    /// Creates every `(email, password_hash, role)` account only when the
    /// store holds no users. All accounts are written or none are; returns
    /// the created users (empty when users already existed).
    fn create_users_if_empty(&self, accounts: &[(&str, &str, UserRole)])
        -> RepoResult<Vec<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, email: &str, password_hash: &str, role: UserRole) -> RepoResult<User> {
        let result = write_transaction(self.conn, |store| {
            let mut users: Vec<User> = store.load_collection(USERS_KEY)?;
            let max_id = users.iter().map(|user| user.id).max();
            let mut ids = IdSequence::load(store, USER_ID_COUNTER_KEY, max_id)?;
            let user = push_user(&mut users, &mut ids, email, password_hash, role)?;

            store.save_collection(USERS_KEY, &users)?;
            ids.persist(store)?;
            Ok(user)
        });

        match &result {
            Ok(user) => info!(
                "event=user_create module=repo status=ok user_id={} role={}",
                user.id,
                user.role.as_str()
            ),
            Err(err) => warn!(
                "event=user_create module=repo status=error error_code={}",
                err.code()
            ),
        }
        result
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let users: Vec<User> = KvStore::new(self.conn).load_collection(USERS_KEY)?;
        Ok(users.into_iter().find(|user| user.id == id))
    }

    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let users: Vec<User> = KvStore::new(self.conn).load_collection(USERS_KEY)?;
        Ok(users.into_iter().find(|user| user.email == email))
    }

    fn get_all_users(&self) -> RepoResult<Vec<User>> {
        KvStore::new(self.conn).load_collection(USERS_KEY)
    }

    fn create_users_if_empty(
        &self,
        accounts: &[(&str, &str, UserRole)],
    ) -> RepoResult<Vec<User>> {
        let result = write_transaction(self.conn, |store| {
            let mut users: Vec<User> = store.load_collection(USERS_KEY)?;
            if !users.is_empty() {
                return Ok(Vec::new());
            }

            let mut ids = IdSequence::load(store, USER_ID_COUNTER_KEY, None)?;
            let mut created = Vec::with_capacity(accounts.len());
            for &(email, password_hash, role) in accounts {
                created.push(push_user(&mut users, &mut ids, email, password_hash, role)?);
            }

            store.save_collection(USERS_KEY, &users)?;
            ids.persist(store)?;
            Ok(created)
        });

        match &result {
            Ok(created) => info!(
                "event=user_seed module=repo status=ok users={}",
                created.len()
            ),
            Err(err) => warn!(
                "event=user_seed module=repo status=error error_code={}",
                err.code()
            ),
        }
        result
    }
}

/// Appends a new account to `users`; the caller persists both collections.
fn push_user(
    users: &mut Vec<User>,
    ids: &mut IdSequence,
    email: &str,
    password_hash: &str,
    role: UserRole,
) -> RepoResult<User> {
    if users.iter().any(|user| user.email == email) {
        return Err(RepoError::Duplicate(DuplicateKey::UserEmail(
            email.to_string(),
        )));
    }

    let user = User {
        id: ids.allocate(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        role,
        created_at: Utc::now(),
    };
    users.push(user.clone());
    Ok(user)
}
