//! Key-Value Store Port - typed persistence over a fixed key namespace.
//!
//! Adapters only move opaque blobs. Encoding and decoding live in
//! [`KeyValueStoreExt`], which is where the best-effort semantics are
//! enforced:
//!
//! - `set(key, None)` or an encode failure removes the key instead of failing
//! - `get` yields `None` both for an unset key and for a blob that no longer
//!   decodes (e.g. schema drift between versions)

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Errors an adapter may report while writing a blob.
///
/// These never escape [`KeyValueStoreExt`]; they only trigger the
/// remove-on-failure path.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Failed to encode value: {0}")]
    EncodeFailed(String),
}

/// The fixed, enumerable namespace of persisted entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    WelcomeMessage,
    CachedThreadIdOnExternalPlatform,
    VisitorId,
    VisitDetails,
    TransactionToken,
}

impl StoreKey {
    /// Every key in the namespace; `purge` walks this list.
    pub const ALL: [StoreKey; 5] = [
        StoreKey::WelcomeMessage,
        StoreKey::CachedThreadIdOnExternalPlatform,
        StoreKey::VisitorId,
        StoreKey::VisitDetails,
        StoreKey::TransactionToken,
    ];

    /// Stable storage name of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::WelcomeMessage => "chatcore.welcomeMessage",
            StoreKey::CachedThreadIdOnExternalPlatform => "chatcore.cachedThreadIdOnExternalPlatform",
            StoreKey::VisitorId => "chatcore.visitorId",
            StoreKey::VisitDetails => "chatcore.visitDetails",
            StoreKey::TransactionToken => "chatcore.transactionToken",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Port for blob persistence keyed by [`StoreKey`].
///
/// # Contract
///
/// Implementations must:
/// - Replace any existing blob on `write`
/// - Return `None` from `read` when nothing is stored
/// - Treat `remove` and `purge` as idempotent
pub trait KeyValueStore: Send + Sync {
    /// Stores a blob, replacing any previous one.
    fn write(&self, key: StoreKey, blob: Vec<u8>) -> Result<(), StoreError>;

    /// Reads the blob stored under `key`.
    fn read(&self, key: StoreKey) -> Option<Vec<u8>>;

    /// Removes the entry under `key`.
    fn remove(&self, key: StoreKey);

    /// Removes every key of the namespace in one operation.
    fn purge(&self);
}

/// Typed, best-effort access on top of any [`KeyValueStore`].
pub trait KeyValueStoreExt: KeyValueStore {
    /// Encodes and stores `value`; clears the key when `value` is `None` or
    /// when encoding/writing fails. Never reports an error.
    fn set<T: Serialize + ?Sized>(&self, key: StoreKey, value: Option<&T>) {
        let outcome = value
            .ok_or_else(|| StoreError::EncodeFailed("no value supplied".to_string()))
            .and_then(|v| {
                serde_json::to_vec(v).map_err(|e| StoreError::EncodeFailed(e.to_string()))
            })
            .and_then(|blob| self.write(key, blob));

        if let Err(e) = outcome {
            tracing::debug!(key = %key, reason = %e, "clearing store entry");
            self.remove(key);
        }
    }

    /// Reads and decodes the value under `key`; decode failures read as absence.
    fn get<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T> {
        let blob = self.read(key)?;
        match serde_json::from_slice(&blob) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "stored entry no longer decodes");
                None
            }
        }
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}
