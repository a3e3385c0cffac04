//! SQLite adapter
//!
//! One database file holds the catalog tables (`t*`, `cn_*`), the
//! nomenclature and every region. The schema version lives in `meta`;
//! opening a file written by another version fails instead of migrating.

mod schema;
mod store;

pub use schema::SCHEMA_VERSION;
pub use store::SqliteConfigStore;
