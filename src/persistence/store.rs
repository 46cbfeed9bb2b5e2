//! Key/value storage abstraction
//!
//! Browsers give us LocalStorage (strings only, may be missing or full).
//! Native builds and tests use an in-memory map.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No backing storage (private mode, sandboxed iframe)
    #[error("storage unavailable")]
    Unavailable,

    /// The backend refused the write (quota, permissions)
    #[error("failed to write {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key/value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Read a non-negative integer, tolerating junk.
///
/// Accepts plain integers and decimals (truncated); anything else,
/// including negatives, reads as 0.
pub fn read_u64(store: &dyn KeyValueStore, key: &str) -> u64 {
    let Some(raw) = store.get(key) else {
        return 0;
    };
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<u64>() {
        return v;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v.trunc() as u64,
        _ => {
            log::warn!("Ignoring malformed value for {}: {:?}", key, raw);
            0
        }
    }
}

pub fn write_u64(store: &mut dyn KeyValueStore, key: &str, value: u64) -> Result<(), StoreError> {
    store.set(key, &value.to_string())
}

/// Read a JSON value, falling back to its default when missing or malformed
pub fn read_json<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    let Some(json) = store.get(key) else {
        return T::default();
    };
    match serde_json::from_str(&json) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Ignoring malformed {}: {}", key, e);
            T::default()
        }
    }
}

pub fn write_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_integers() {
        let mut store = MemoryStore::new();
        assert_eq!(read_u64(&store, "missing"), 0);
        for (raw, expected) in [
            ("42", 42),
            (" 7 ", 7),
            ("12.9", 12),
            ("abc", 0),
            ("-5", 0),
            ("NaN", 0),
            ("", 0),
        ] {
            store.set("k", raw).unwrap();
            assert_eq!(read_u64(&store, "k"), expected, "raw {raw:?}");
        }
    }

    #[test]
    fn test_json_fallback() {
        let mut store = MemoryStore::new();
        store.set("list", "[1, 2").unwrap();
        let list: Vec<u32> = read_json(&store, "list");
        assert!(list.is_empty());

        write_json(&mut store, "list", &vec![3u32, 4]).unwrap();
        let list: Vec<u32> = read_json(&store, "list");
        assert_eq!(list, vec![3, 4]);
    }

    #[test]
    fn test_remove() {
        let mut store = MemoryStore::new();
        write_u64(&mut store, "n", 9).unwrap();
        assert_eq!(store.len(), 1);
        store.remove("n").unwrap();
        assert!(store.is_empty());
    }
}
