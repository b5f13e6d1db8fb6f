//! Visitor-local key/value storage.
//!
//! Stores persist their state as JSON strings under fixed keys, the same way a
//! browser keeps them in `localStorage`. In the running storefront the visitor
//! session is the backing store; tests use [`MemoryStorage`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tower_sessions::Session;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The session backend failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// A value could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The in-memory map lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// String key/value storage scoped to one visitor.
pub trait LocalStorage: Clone + Send + Sync {
    /// Read the raw string stored under `key`.
    fn get_item(&self, key: &str)
    -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete the value stored under `key`.
    fn remove_item(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl LocalStorage for Session {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get::<String>(key).await?)
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.insert(key, value).await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.remove::<String>(key).await?;
        Ok(())
    }
}

/// In-memory storage, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.lock()?.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.items.lock()?.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.lock()?.remove(key);
        Ok(())
    }
}

/// Outcome of reading a JSON value from storage.
#[derive(Debug)]
pub enum Stored<T> {
    /// Nothing stored under the key.
    Missing,
    /// The stored value parsed.
    Value(T),
    /// The stored value exists but is not valid for `T`.
    Corrupt(serde_json::Error),
}

/// Read and parse the JSON value stored under `key`.
///
/// # Errors
///
/// Returns `StorageError` only when the backend fails; unparsable data is
/// reported as [`Stored::Corrupt`].
pub async fn read_json<S, T>(storage: &S, key: &str) -> Result<Stored<T>, StorageError>
where
    S: LocalStorage,
    T: DeserializeOwned,
{
    let Some(raw) = storage.get_item(key).await? else {
        return Ok(Stored::Missing);
    };
    Ok(match serde_json::from_str(&raw) {
        Ok(value) => Stored::Value(value),
        Err(e) => Stored::Corrupt(e),
    })
}

/// Serialize `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns `StorageError` if serialization or the backend fails.
pub async fn write_json<S, T>(storage: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    S: LocalStorage,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    storage.set_item(key, raw).await
}
