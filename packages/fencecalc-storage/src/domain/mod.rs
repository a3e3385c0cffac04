//! Storage Domain Layer
//!
//! Port/Adapter pattern for storage backend abstraction

pub mod models;
pub mod ports;

pub use models::{
    CatalogSeed, ComponentId, ComponentTypeId, ComponentTypeRow, ConfigUpdate, NewRegion,
    NomenclatureEdge, NomenclatureId, NomenclatureImport, NomenclatureRow, ParamEdge,
    ParamTypeId, ParamTypeRow, ParamValue, ParamValueRow, PartTypeId, PartTypeRow, RegionId,
    RegionParamRow, RegionPartRow, RegionRow, RegionTypeId, RegionTypeRow,
};
pub use ports::{
    CatalogBootstrap, CompatibilityStore, ConfigStore, DeclaredValue, RegionConfigStore,
    RegionConfigWriter, RegionRepository,
};
