//! Client Storage
//!
//! Key/value persistence in `localStorage`. Every key carries the server
//! port so several local server instances don't overwrite each other.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage rejected write for `{0}`")]
    Rejected(String),
    #[error("could not serialize value for `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str);
}

/// `window.localStorage`
#[derive(Clone)]
pub struct BrowserStorage {
    inner: web_sys::Storage,
}

impl BrowserStorage {
    pub fn local() -> Option<Self> {
        let inner = web_sys::window()?.local_storage().ok().flatten()?;
        Some(Self { inner })
    }
}

impl KeyValueStorage for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner
            .set_item(key, value)
            .map_err(|_| StorageError::Rejected(key.to_string()))
    }

    fn remove(&self, key: &str) {
        let _ = self.inner.remove_item(key);
    }
}

/// In-memory storage; clones share the same map
#[derive(Clone, Default, Debug)]
pub struct MemoryStorage {
    map: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.map.borrow_mut().remove(key);
    }
}

/// Either storage backend, so the app can fall back to memory when
/// `localStorage` is unavailable (private mode, sandboxed frames)
#[derive(Clone)]
pub enum AnyStorage {
    Browser(BrowserStorage),
    Memory(MemoryStorage),
}

impl AnyStorage {
    pub fn detect() -> Self {
        match BrowserStorage::local() {
            Some(storage) => AnyStorage::Browser(storage),
            None => {
                tracing::warn!("localStorage unavailable, settings will not persist");
                AnyStorage::Memory(MemoryStorage::new())
            }
        }
    }
}

impl KeyValueStorage for AnyStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            AnyStorage::Browser(s) => s.get(key),
            AnyStorage::Memory(s) => s.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            AnyStorage::Browser(s) => s.set(key, value),
            AnyStorage::Memory(s) => s.set(key, value),
        }
    }

    fn remove(&self, key: &str) {
        match self {
            AnyStorage::Browser(s) => s.remove(key),
            AnyStorage::Memory(s) => s.remove(key),
        }
    }
}

/// Port-namespaced storage keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    port: String,
}

impl StorageKeys {
    pub fn new(port: impl Into<String>) -> Self {
        Self { port: port.into() }
    }

    fn key(&self, name: &str) -> String {
        format!("{}_{}", name, self.port)
    }

    pub fn recently_used(&self) -> String {
        self.key("codeRecentElements")
    }

    pub fn last_open_method(&self) -> String {
        self.key("codeLastOpenMethod")
    }

    pub fn resizer_width(&self, pane: &str) -> String {
        self.key(&format!("codeResizerLeftPosition.{}", pane))
    }

    pub fn active_tab(&self, entity_id: &str) -> String {
        self.key(&format!("codeActiveTab.{}", entity_id))
    }

    pub fn selected_object(&self) -> String {
        self.key("codeSelectedObject")
    }
}

pub fn load_json<T: DeserializeOwned>(storage: &impl KeyValueStorage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding unreadable stored value");
            None
        }
    }
}

pub fn store_json<T: Serialize + ?Sized>(storage: &impl KeyValueStorage, key: &str, value: &T) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize { key: key.to_string(), source })?;
    storage.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced_by_port() {
        let a = StorageKeys::new("8082");
        let b = StorageKeys::new("8083");
        assert_eq!(a.recently_used(), "codeRecentElements_8082");
        assert_ne!(a.recently_used(), b.recently_used());
        assert_eq!(a.active_tab("t1"), "codeActiveTab.t1_8082");
        assert_eq!(a.resizer_width("tree"), "codeResizerLeftPosition.tree_8082");
    }

    #[test]
    fn test_memory_storage_clones_share_state() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.set("k", "v").unwrap();
        assert_eq!(other.get("k").as_deref(), Some("v"));
        other.remove("k");
        assert_eq!(storage.get("k"), None);
    }

    #[test]
    fn test_json_helpers() {
        let storage = MemoryStorage::new();
        store_json(&storage, "widths", &vec![240, 320]).unwrap();
        assert_eq!(load_json::<Vec<u32>>(&storage, "widths"), Some(vec![240, 320]));

        storage.set("broken", "{not json").unwrap();
        assert_eq!(load_json::<Vec<u32>>(&storage, "broken"), None);
        assert_eq!(load_json::<Vec<u32>>(&storage, "missing"), None);
    }
}
