//! File-based Key-Value Store Adapter
//!
//! Stores each entry as `<key>.json` inside a base directory.
//! Writes go through a temporary file and a rename so a reader never sees a
//! half-written blob.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::ports::{KeyValueStore, StoreError, StoreKey};

/// File-based blob storage
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    base_path: PathBuf,
}

impl FileKeyValueStore {
    /// Create a new file store rooted at `base_path`
    ///
    /// The directory is created lazily on first write.
    ///
    /// # Example
    /// ```ignore
    /// let store = FileKeyValueStore::new("./data/chat");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Get the file path for a key
    fn entry_path(&self, key: StoreKey) -> PathBuf {
        self.base_path.join(format!("{}.json", key.as_str()))
    }

    fn remove_file(&self, key: StoreKey) {
        if let Err(e) = fs::remove_file(self.entry_path(key)) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(key = %key, error = %e, "failed to remove store entry");
            }
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn write(&self, key: StoreKey, blob: Vec<u8>) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path).map_err(|e| StoreError::IoError(e.to_string()))?;

        let path = self.entry_path(key);
        let staging = path.with_extension("json.tmp");

        fs::write(&staging, blob).map_err(|e| StoreError::IoError(e.to_string()))?;
        fs::rename(&staging, &path).map_err(|e| StoreError::IoError(e.to_string()))?;

        Ok(())
    }

    fn read(&self, key: StoreKey) -> Option<Vec<u8>> {
        match fs::read(self.entry_path(key)) {
            Ok(blob) => Some(blob),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to read store entry");
                None
            }
        }
    }

    fn remove(&self, key: StoreKey) {
        self.remove_file(key);
    }

    fn purge(&self) {
        tracing::trace!(path = %self.base_path.display(), "Removing all keys from file store");
        for key in StoreKey::ALL {
            self.remove_file(key);
        }
    }
}
