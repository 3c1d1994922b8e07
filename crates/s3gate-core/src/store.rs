//! Persistence seam for credentials, policies, and bucket metadata.
//!
//! The engine never owns durable state. It reads and writes opaque byte
//! values under composite string keys (`user/<name>`, `buckets/-<name>`, ...)
//! through [`KvStore`]. [`MemoryStore`] is a `DashMap`-backed implementation
//! for tests and single-process deployments.

use std::fmt;

use bytes::Bytes;
use dashmap::DashMap;

/// Errors surfaced by a [`KvStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No value is stored under the key.
    #[error("key not found: {0}")]
    NotFound(String),

    /// The backing store failed.
    #[error("store backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    /// Whether this error only reports a missing key.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Key/value persistence used by the IAM layer.
///
/// Reads must observe the latest committed write for the same key within a
/// process. Writers to distinct keys must not block each other.
pub trait KvStore: Send + Sync + fmt::Debug {
    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the key is absent.
    fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: Bytes) -> Result<(), StoreError>;

    /// Remove `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the key is absent.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Thread-safe in-memory [`KvStore`].
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use s3gate_core::{KvStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.put("user/alice", Bytes::from_static(b"{}")).unwrap();
/// assert_eq!(store.get("user/alice").unwrap(), Bytes::from_static(b"{}"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: DashMap<String, Bytes>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Remove every key.
    pub fn reset(&self) {
        self.inner.clear();
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        self.inner
            .get(key)
            .map(|v| v.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_owned()))
    }

    fn put(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        self.inner.insert(key.to_owned(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_owned()))
    }
}
