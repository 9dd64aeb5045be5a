//! Ownership of the live transaction token.
//!
//! `TokenLifecycle` is the single writer of both the in-memory token and its
//! `StoreKey::TransactionToken` slot. Readers clone the current value under a
//! shared read lock; only `store`, `update` and `clear` take the write lock,
//! and they update the persisted slot and the in-memory value inside the same
//! critical section so no reader observes one without the other.

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::foundation::{Expirable, Timestamp};
use crate::ports::{KeyValueStore, KeyValueStoreExt, StoreKey};

use super::TransactionToken;

/// Holds, persists and restores the session's transaction token.
pub struct TokenLifecycle {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Option<TransactionToken>>,
}

impl TokenLifecycle {
    /// Creates a lifecycle, restoring a previously persisted token if one
    /// decodes and still satisfies the token invariants.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let restored = store
            .get::<TransactionToken>(StoreKey::TransactionToken)
            .filter(|token| token.validate().is_ok());

        if restored.is_some() {
            tracing::debug!("Restored persisted transaction token");
        }

        Self {
            store,
            current: RwLock::new(restored),
        }
    }

    /// Returns a copy of the current token. Absence is not an error; callers
    /// are expected to fetch a new one.
    pub fn current(&self) -> Option<TransactionToken> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the current token only while it is not expired.
    pub fn valid(&self) -> Option<TransactionToken> {
        self.current().filter(|token| !token.is_expired())
    }

    /// True when there is no usable token: none held, an empty value, or
    /// inside the expiry safety margin.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(&Timestamp::now())
    }

    /// [`TokenLifecycle::is_expired`] evaluated against `now`.
    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(token) => token.value.is_empty() || token.is_expired_at(now),
            None => true,
        }
    }

    /// Persists `token` and makes it current, replacing any previous token.
    pub fn store(&self, token: TransactionToken) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        self.store.set(StoreKey::TransactionToken, Some(&token));
        *guard = Some(token);
        tracing::debug!("Stored transaction token");
    }

    /// Read-modify-write of the current token under a single write lock.
    ///
    /// `f` sees the token held at the moment the lock is taken; returning
    /// `Some` persists and installs the replacement, `None` leaves the token
    /// untouched. Returns the token current after the call, or `None` when
    /// the lifecycle is empty and `f` was never invoked.
    pub fn update<F>(&self, f: F) -> Option<TransactionToken>
    where
        F: FnOnce(&TransactionToken) -> Option<TransactionToken>,
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let replacement = f(guard.as_ref()?);
        if let Some(token) = replacement {
            self.store.set(StoreKey::TransactionToken, Some(&token));
            *guard = Some(token);
            tracing::debug!("Updated transaction token");
        }
        guard.clone()
    }

    /// Removes the persisted entry and the in-memory token together.
    pub fn clear(&self) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        self.store.remove(StoreKey::TransactionToken);
        *guard = None;
        tracing::debug!("Cleared transaction token");
    }
}
