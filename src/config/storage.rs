//! Key-value store configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::adapters::storage::{FileKeyValueStore, InMemoryKeyValueStore};
use crate::ports::KeyValueStore;

/// Where session state is persisted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory for the file-backed store; in-memory when unset
    pub directory: Option<PathBuf>,
}

impl StorageConfig {
    /// Build the configured store
    pub fn key_value_store(&self) -> Arc<dyn KeyValueStore> {
        match &self.directory {
            Some(directory) => Arc::new(FileKeyValueStore::new(directory)),
            None => Arc::new(InMemoryKeyValueStore::new()),
        }
    }
}
