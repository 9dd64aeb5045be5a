//! In-Memory Key-Value Store Adapter
//!
//! Keeps blobs in a map for the lifetime of the process.
//! Useful for testing and for clients that do not persist between launches.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::ports::{KeyValueStore, StoreError, StoreKey};

/// In-memory blob storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<StoreKey, Vec<u8>>>>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn write(&self, key: StoreKey, blob: Vec<u8>) -> Result<(), StoreError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, blob);
        Ok(())
    }

    fn read(&self, key: StoreKey) -> Option<Vec<u8>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn remove(&self, key: StoreKey) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
    }

    fn purge(&self) {
        tracing::trace!("Removing all keys from in-memory store");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
