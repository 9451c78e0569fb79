//! Lock store: ordered map of participant → lock record.
//!
//! At most one record per participant. [`LockStore::insert_new`] is the
//! only checked insertion; [`LockStore::put`] overwrites and is reserved
//! for committing a release the state machine has re-checked.

use std::collections::BTreeMap;

use lockstake_types::{Address, EscrowError, LockRecord, Result};
use serde::{Deserialize, Serialize};

/// Ordered storage of lock records keyed by participant address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStore {
    locks: BTreeMap<Address, LockRecord>,
}

impl LockStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record for a participant that has none.
    ///
    /// # Errors
    /// Returns `AlreadyLocked` if any record, released or not, exists.
    pub fn insert_new(&mut self, record: LockRecord) -> Result<()> {
        if self.locks.contains_key(&record.user) {
            return Err(EscrowError::AlreadyLocked(record.user));
        }
        self.locks.insert(record.user, record);
        Ok(())
    }

    /// Unconditional write.
    pub fn put(&mut self, user: Address, record: LockRecord) {
        self.locks.insert(user, record);
    }

    #[must_use]
    pub fn get(&self, user: &Address) -> Option<&LockRecord> {
        self.locks.get(user)
    }

    #[must_use]
    pub fn contains(&self, user: &Address) -> bool {
        self.locks.contains_key(user)
    }

    /// A record exists and has not been released.
    #[must_use]
    pub fn contains_active(&self, user: &Address) -> bool {
        self.locks.get(user).is_some_and(LockRecord::is_active)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.locks.values().filter(|r| r.is_active()).count()
    }

    /// Records in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &LockRecord)> {
        self.locks.iter()
    }

    /// Serialize every record as JSON.
    pub fn snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuild a store from [`LockStore::snapshot`] output.
    ///
    /// # Errors
    /// `Serialization` for malformed JSON; `InvalidArgument` if a record
    /// breaks the amount/goal/bonus ranges; `Internal` if a record is
    /// filed under another participant's key.
    pub fn restore(json: &str) -> Result<Self> {
        let store: Self = serde_json::from_str(json)?;
        for (key, record) in &store.locks {
            if *key != record.user {
                return Err(EscrowError::Internal(format!(
                    "record for {} stored under {key}",
                    record.user
                )));
            }
            record.validate()?;
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_new_refuses_overwrite() {
        let mut store = LockStore::new();
        let record = LockRecord::dummy(10, 30, 5);
        store.insert_new(record).unwrap();

        let mut other = LockRecord::dummy(99, 1, 0);
        other.user = record.user;
        let err = store.insert_new(other).unwrap_err();
        assert!(matches!(err, EscrowError::AlreadyLocked(a) if a == record.user));
        assert_eq!(store.get(&record.user), Some(&record));
    }

    #[test]
    fn released_record_still_blocks_insert() {
        let mut store = LockStore::new();
        let mut record = LockRecord::dummy(10, 30, 5);
        record.released = true;
        store.put(record.user, record);
        assert!(store.contains(&record.user));
        assert!(!store.contains_active(&record.user));
        assert!(store.insert_new(LockRecord { released: false, ..record }).is_err());
    }

    #[test]
    fn counts() {
        let mut store = LockStore::new();
        assert!(store.is_empty());
        for i in 0..5 {
            let mut r = LockRecord::dummy(10, 30, 5);
            r.released = i % 2 == 0;
            store.insert_new(r).unwrap();
        }
        assert_eq!(store.len(), 5);
        assert_eq!(store.active_count(), 2);
    }

    #[test]
    fn iter_is_address_ordered() {
        let mut store = LockStore::new();
        for _ in 0..10 {
            store.insert_new(LockRecord::dummy(1, 1, 0)).unwrap();
        }
        let keys: Vec<_> = store.iter().map(|(k, _)| *k).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn snapshot_restore() {
        let mut store = LockStore::new();
        for _ in 0..3 {
            store.insert_new(LockRecord::dummy(1_000, 7, 20)).unwrap();
        }
        let json = store.snapshot().unwrap();
        assert_eq!(LockStore::restore(&json).unwrap(), store);
    }

    #[test]
    fn restore_rejects_mismatched_key() {
        let mut store = LockStore::new();
        let record = LockRecord::dummy(10, 30, 5);
        store.put(Address::random(), record);
        let err = LockStore::restore(&store.snapshot().unwrap()).unwrap_err();
        assert!(matches!(err, EscrowError::Internal(_)));
    }

    #[test]
    fn restore_rejects_out_of_range_record() {
        let mut store = LockStore::new();
        let mut record = LockRecord::dummy(10, 30, 5);
        record.bonus_percent = 150;
        store.put(record.user, record);
        let err = LockStore::restore(&store.snapshot().unwrap()).unwrap_err();
        assert!(matches!(err, EscrowError::InvalidArgument { .. }));
    }

    #[test]
    fn restore_rejects_garbage() {
        assert!(matches!(
            LockStore::restore("{not json").unwrap_err(),
            EscrowError::Serialization(_)
        ));
    }
}
