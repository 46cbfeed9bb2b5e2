//! Persistence of records and settings
//!
//! Everything goes through `KeyValueStore` so the same code runs against
//! LocalStorage in the browser and an in-memory map elsewhere. Reads never
//! fail: missing or malformed values fall back to defaults.

pub mod store;

pub use store::{
    KeyValueStore, MemoryStore, StoreError, read_json, read_u64, write_json, write_u64,
};
