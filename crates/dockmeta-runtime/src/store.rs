//! Process-lifetime cache of container inspection results.
//!
//! Append-only: a record is never refreshed or evicted once stored, even
//! if the container is removed or its identifier is reused by the runtime.
//! Inspection is an out-of-process call and container configuration does
//! not change after creation, so metadata may go stale for a recreated
//! container until the process restarts.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use dockmeta_common::types::{ContainerId, ContainerRecord};

/// Mapping from container identifier to its inspection record.
#[derive(Debug, Default)]
pub struct MetadataStore {
    records: RwLock<HashMap<ContainerId, Arc<ContainerRecord>>>,
}

impl MetadataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored record for `id`, if any.
    #[must_use]
    pub fn lookup(&self, id: &ContainerId) -> Option<Arc<ContainerRecord>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Stores `record` for `id` unless one is already present.
    ///
    /// Returns the record that ends up stored: on a race between two
    /// inspections of the same container the first insert wins.
    pub fn insert(&self, id: ContainerId, record: ContainerRecord) -> Arc<ContainerRecord> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(records.entry(id).or_insert_with(|| Arc::new(record)))
    }

    /// Returns whether a record is stored for `id`.
    #[must_use]
    pub fn contains(&self, id: &ContainerId) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether nothing has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(image: &str) -> ContainerRecord {
        ContainerRecord::from_attributes(json!({ "Config": { "Image": image } }))
    }

    #[test]
    fn new_store_is_empty() {
        let store = MetadataStore::new();
        assert!(store.is_empty());
        assert!(store.lookup(&ContainerId::new("a")).is_none());
    }

    #[test]
    fn insert_then_lookup() {
        let store = MetadataStore::new();
        let id = ContainerId::new("a");
        let _ = store.insert(id.clone(), record("nginx"));
        let found = store.lookup(&id).expect("stored");
        assert_eq!(found.attributes()["Config"]["Image"], "nginx");
        assert!(store.contains(&id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn first_insert_wins() {
        let store = MetadataStore::new();
        let id = ContainerId::new("a");
        let first = store.insert(id.clone(), record("first"));
        let second = store.insert(id.clone(), record("second"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            store.lookup(&id).expect("stored").attributes()["Config"]["Image"],
            "first"
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn store_is_shared_across_threads() {
        let store = Arc::new(MetadataStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let _ = store.insert(ContainerId::new(format!("c{}", i % 4)), record("x"));
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread");
        }
        assert_eq!(store.len(), 4);
    }
}
