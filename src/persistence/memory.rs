//! Process-local key-value store.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::persistence::{error::PersistenceError, traits::KeyValueStore};

/// A `KeyValueStore` kept entirely in memory.
///
/// Clones share the same underlying map, so a clone handed to a second
/// state store observes everything the first one persisted.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with a single entry.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        if let Ok(mut inner) = store.inner.lock() {
            inner.insert(key.to_string(), value.to_string());
        }
        store
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| PersistenceError::OperationFailed("lock poisoned".into()))?;
        Ok(inner.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| PersistenceError::OperationFailed("lock poisoned".into()))?;
        inner.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), PersistenceError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| PersistenceError::OperationFailed("lock poisoned".into()))?;
        inner.remove(key);
        Ok(())
    }
}
