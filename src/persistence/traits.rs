//! Storage interfaces used by the notification state store.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::persistence::error::PersistenceError;

/// A string key-value store holding serialized documents.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieves the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Inserts or replaces the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Removes the value stored under `key`. Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), PersistenceError>;
}
