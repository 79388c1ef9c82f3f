//! Recently Used Registry
//!
//! Most-recent-first list of visited nodes, persisted in client storage.

use crate::models::RecentlyUsedEntry;
use crate::storage::{load_json, store_json, KeyValueStorage, StorageKeys};

pub const RECENTLY_USED_CAPACITY: usize = 10;

pub struct RecentlyUsedRegistry<S: KeyValueStorage> {
    storage: S,
    key: String,
    capacity: usize,
    entries: Vec<RecentlyUsedEntry>,
}

impl<S: KeyValueStorage> RecentlyUsedRegistry<S> {
    pub fn new(storage: S, keys: &StorageKeys) -> Self {
        Self::with_capacity(storage, keys, RECENTLY_USED_CAPACITY)
    }

    pub fn with_capacity(storage: S, keys: &StorageKeys, capacity: usize) -> Self {
        Self {
            storage,
            key: keys.recently_used(),
            capacity: capacity.max(1),
            entries: Vec::new(),
        }
    }

    /// Replay the persisted list in storage order
    pub fn load_all(&mut self) -> &[RecentlyUsedEntry] {
        let mut stored: Vec<RecentlyUsedEntry> = load_json(&self.storage, &self.key).unwrap_or_default();
        stored.truncate(self.capacity);
        self.entries = stored;
        &self.entries
    }

    /// Move or insert an entry at the front. Returns the entries evicted from the tail.
    pub fn add(&mut self, id: &str, name: &str, icon_class: &str, path: &str) -> Vec<RecentlyUsedEntry> {
        self.entries.retain(|e| e.id != id);
        self.entries.insert(
            0,
            RecentlyUsedEntry {
                id: id.to_string(),
                name: name.to_string(),
                icon_class: icon_class.to_string(),
                path: path.to_string(),
            },
        );

        let evicted = if self.entries.len() > self.capacity {
            self.entries.split_off(self.capacity)
        } else {
            Vec::new()
        };
        self.persist();
        evicted
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn entries(&self) -> &[RecentlyUsedEntry] {
        &self.entries
    }

    fn persist(&self) {
        if let Err(e) = store_json(&self.storage, &self.key, &self.entries) {
            tracing::warn!(error = %e, "could not persist recently used list");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn registry(storage: &MemoryStorage) -> RecentlyUsedRegistry<MemoryStorage> {
        RecentlyUsedRegistry::new(storage.clone(), &StorageKeys::new("8082"))
    }

    #[test]
    fn test_add_never_exceeds_capacity() {
        let storage = MemoryStorage::new();
        let mut recent = registry(&storage);

        let mut evicted = Vec::new();
        for i in 0..13 {
            evicted.extend(recent.add(&format!("id{}", i), "n", "icon-type", &format!("custom-id{}", i)));
        }

        assert_eq!(recent.entries().len(), RECENTLY_USED_CAPACITY);
        assert_eq!(recent.entries()[0].id, "id12");
        assert_eq!(evicted.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), vec!["id0", "id1", "id2"]);

        let persisted: Vec<RecentlyUsedEntry> = load_json(&storage, "codeRecentElements_8082").unwrap();
        assert_eq!(persisted.len(), RECENTLY_USED_CAPACITY);
    }

    #[test]
    fn test_readding_moves_to_front_without_duplicate() {
        let storage = MemoryStorage::new();
        let mut recent = registry(&storage);
        recent.add("a", "A", "icon-type", "custom-a");
        recent.add("b", "B", "icon-type", "custom-b");
        recent.add("a", "A2", "icon-type", "custom-a");

        let ids: Vec<_> = recent.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(recent.entries()[0].name, "A2");
    }

    #[test]
    fn test_load_all_replays_storage_order() {
        let storage = MemoryStorage::new();
        {
            let mut recent = registry(&storage);
            recent.add("a", "A", "icon-type", "custom-a");
            recent.add("b", "B", "icon-method", "globals-b");
        }

        let mut reloaded = registry(&storage);
        let ids: Vec<_> = reloaded.load_all().iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_remove_persists() {
        let storage = MemoryStorage::new();
        let mut recent = registry(&storage);
        recent.add("a", "A", "icon-type", "custom-a");
        assert!(recent.remove("a"));
        assert!(!recent.remove("a"));

        let mut reloaded = registry(&storage);
        assert!(reloaded.load_all().is_empty());
    }

    #[test]
    fn test_ports_do_not_collide() {
        let storage = MemoryStorage::new();
        let mut first = RecentlyUsedRegistry::new(storage.clone(), &StorageKeys::new("8082"));
        first.add("a", "A", "icon-type", "custom-a");

        let mut second = RecentlyUsedRegistry::new(storage.clone(), &StorageKeys::new("9090"));
        assert!(second.load_all().is_empty());
    }
}
