//! Durable storage backends for notification state.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::InMemoryKeyValueStore;
pub use sqlite::SqliteStateRepository;
