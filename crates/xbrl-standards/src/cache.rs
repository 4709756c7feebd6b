#![deny(unsafe_code)]

//! Read-mostly snapshot cache.
//!
//! Readers clone the `Arc` under a short read lock. Writers build the new
//! value outside the lock and swap it in whole.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use crate::baseline::{BaselineKey, BaselineSnapshot, BaselineStore};
use crate::error::StandardsError;

#[derive(Debug)]
pub struct SnapshotCache<K, V> {
    entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K, V> Default for SnapshotCache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V> SnapshotCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    /// Replaces the snapshot for `key`, returning the previous one.
    pub fn swap(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, Arc::clone(&value));
        value
    }

    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type BaselineCache = SnapshotCache<BaselineKey, BaselineSnapshot>;

impl SnapshotCache<BaselineKey, BaselineSnapshot> {
    /// Returns the cached snapshot, reading it from `store` on first use.
    pub fn get_or_load(
        &self,
        store: &BaselineStore,
        key: &BaselineKey,
    ) -> Result<Option<Arc<BaselineSnapshot>>, StandardsError> {
        if let Some(snapshot) = self.get(key) {
            return Ok(Some(snapshot));
        }
        Ok(store
            .load(key)?
            .map(|snapshot| self.swap(key.clone(), snapshot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_keep_old_snapshot_after_swap() {
        let cache: SnapshotCache<String, Vec<u32>> = SnapshotCache::new();
        cache.swap("a".to_string(), vec![1]);
        let held = cache.get(&"a".to_string()).unwrap();
        cache.swap("a".to_string(), vec![2, 3]);
        assert_eq!(*held, vec![1]);
        assert_eq!(*cache.get(&"a".to_string()).unwrap(), vec![2, 3]);
        assert_eq!(cache.len(), 1);
        assert!(cache.remove(&"a".to_string()).is_some());
        assert!(cache.is_empty());
    }
}
