//! Browser LocalStorage backend

use crate::persistence::{KeyValueStore, StoreError};

pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// None when the page has no usable storage (private mode, sandbox)
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()?;
        Some(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StoreError::Write {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StoreError::Write {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }
}

/// LocalStorage if available, otherwise an in-memory store for this session
pub fn open_store() -> Box<dyn KeyValueStore> {
    match LocalStorage::open() {
        Some(store) => Box::new(store),
        None => {
            log::warn!("{}; records will not persist", StoreError::Unavailable);
            Box::new(crate::persistence::MemoryStore::new())
        }
    }
}
