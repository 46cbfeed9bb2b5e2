//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (keyboard, touch) to intents
//! - Storage (LocalStorage on web, memory elsewhere)

pub mod input;
#[cfg(target_arch = "wasm32")]
pub mod storage;

pub use input::{Intent, TouchTracker, apply_intent, key_intent, take_input};

/// Open the best available key/value store for this platform
#[cfg(target_arch = "wasm32")]
pub fn open_store() -> Box<dyn crate::persistence::KeyValueStore> {
    storage::open_store()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn open_store() -> Box<dyn crate::persistence::KeyValueStore> {
    Box::new(crate::persistence::MemoryStore::new())
}
