//! fencecalc-storage - catalog, compatibility and region configuration store
//!
//! ## Layout
//!
//! - `domain::models`: typed ids, `ParamValue`, catalog and region rows
//! - `domain::ports`: blocking storage traits used by the resolver and the
//!   region service
//! - `infrastructure`: SQLite adapter (feature `sqlite`, default) and an
//!   in-memory adapter for tests and embedding
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fencecalc_storage::{SqliteConfigStore, RegionConfigStore};
//!
//! let store = SqliteConfigStore::open("fence.db")?;
//! let params = store.region_params(region_id)?;
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{ErrorKind, Result, StorageError};

pub use domain::{
    CatalogBootstrap, CatalogSeed, CompatibilityStore, ComponentId, ComponentTypeId,
    ComponentTypeRow, ConfigStore, ConfigUpdate, DeclaredValue, NewRegion, NomenclatureEdge,
    NomenclatureId, NomenclatureImport, NomenclatureRow, ParamEdge, ParamTypeId, ParamTypeRow,
    ParamValue, ParamValueRow, PartTypeId, PartTypeRow, RegionConfigStore, RegionConfigWriter,
    RegionId, RegionParamRow, RegionPartRow, RegionRepository, RegionRow, RegionTypeId,
    RegionTypeRow,
};

pub use infrastructure::InMemoryConfigStore;
#[cfg(feature = "sqlite")]
pub use infrastructure::{SqliteConfigStore, SCHEMA_VERSION};
