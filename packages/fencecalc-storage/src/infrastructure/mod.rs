//! Infrastructure layer - Storage adapters

pub mod memory_store;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory_store::InMemoryConfigStore;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConfigStore, SCHEMA_VERSION};
