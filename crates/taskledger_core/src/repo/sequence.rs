//! Monotonic id sequences persisted next to the collections they number.
//!
//! # Invariants
//! - `next` is never below the persisted counter nor below `max(existing) + 1`.
//! - Handed-out ids are never handed out again, even after deletion.

use crate::repo::error::RepoResult;
use crate::repo::kv_store::KvStore;

/// Id generator for one collection, loaded inside the operation's transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSequence {
    key: &'static str,
    next: i64,
}

impl IdSequence {
    /// Loads the high-water mark stored under `counter_key`.
    ///
    /// `existing_max` guards against a counter that lags behind the data, e.g.
    /// a store written by an older build that lost its counter key.
    pub fn load(
        store: &KvStore<'_>,
        counter_key: &'static str,
        existing_max: Option<i64>,
    ) -> RepoResult<Self> {
        let persisted = store.load_counter(counter_key)?.unwrap_or(1);
        let floor = existing_max.map_or(1, |max| max.saturating_add(1));
        Ok(Self {
            key: counter_key,
            next: persisted.max(floor).max(1),
        })
    }

    /// Next id that [`IdSequence::allocate`] would return.
    pub fn peek(&self) -> i64 {
        self.next
    }

    /// True when no id has ever been handed out.
    pub fn is_fresh(&self) -> bool {
        self.next == 1
    }

    pub fn allocate(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Advances past an externally chosen id.
    pub fn observe(&mut self, id: i64) {
        if id >= self.next {
            self.next = id.saturating_add(1);
        }
    }

    pub fn persist(&self, store: &KvStore<'_>) -> RepoResult<()> {
        store.save_counter(self.key, self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::IdSequence;
    use crate::db::open_db_in_memory;
    use crate::repo::kv_store::KvStore;

    #[test]
    fn starts_at_one_and_persists_high_water_mark() {
        let conn = open_db_in_memory().unwrap();
        let store = KvStore::new(&conn);

        let mut seq = IdSequence::load(&store, "widgetIdCounter", None).unwrap();
        assert!(seq.is_fresh());
        assert_eq!(seq.allocate(), 1);
        assert_eq!(seq.allocate(), 2);
        seq.persist(&store).unwrap();

        assert_eq!(store.get_raw("widgetIdCounter").unwrap().as_deref(), Some("3"));
        let reloaded = IdSequence::load(&store, "widgetIdCounter", Some(1)).unwrap();
        assert_eq!(reloaded.peek(), 3);
    }

    #[test]
    fn lagging_counter_is_lifted_above_existing_ids() {
        let conn = open_db_in_memory().unwrap();
        let store = KvStore::new(&conn);
        store.save_counter("widgetIdCounter", 2).unwrap();

        let mut seq = IdSequence::load(&store, "widgetIdCounter", Some(9)).unwrap();
        assert_eq!(seq.allocate(), 10);

        seq.observe(40);
        assert_eq!(seq.peek(), 41);
        seq.observe(5);
        assert_eq!(seq.peek(), 41);
    }
}
