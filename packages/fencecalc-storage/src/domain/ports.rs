//! Storage Ports (Trait Interfaces)
//!
//! Port/Adapter pattern for backend flexibility:
//! - Production: SQLite (single file, foreign keys enforced)
//! - Testing / embedding: InMemory
//!
//! All calls are blocking. Readers never mutate; `RegionConfigWriter`
//! applies a whole `ConfigUpdate` or nothing.

use std::collections::HashMap;

use super::models::{
    CatalogSeed, ConfigUpdate, NewRegion, NomenclatureId, NomenclatureImport, ParamTypeId,
    ParamValue, PartTypeId, RegionId, RegionParamRow, RegionPartRow, RegionRow, RegionTypeId,
};
use crate::Result;

/// Declared value of a parameter type, with its display label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredValue {
    pub value: ParamValue,
    pub label: String,
}

/// Catalog and compatibility lookups used during resolution
pub trait CompatibilityStore: Send + Sync {
    /// All declared values of a parameter type, in declaration order
    fn declared_values(&self, param_type: ParamTypeId) -> Result<Vec<DeclaredValue>>;

    /// Dependent values allowed for `dependent_type` while `param_type`
    /// holds `value`. Empty when no edge is declared.
    fn dependent_values(
        &self,
        param_type: ParamTypeId,
        value: ParamValue,
        dependent_type: ParamTypeId,
    ) -> Result<Vec<ParamValue>>;

    /// Generic allowed nomenclature of a part type, ascending with `None`
    /// first
    fn part_nomenclature(&self, part_type: PartTypeId) -> Result<Vec<Option<NomenclatureId>>>;

    /// Nomenclature allowed for `part_type` while `param_type` holds
    /// `value`. Empty when the parameter is not linked to the part type or
    /// declares no edge for this value.
    fn nomenclature_for_param(
        &self,
        param_type: ParamTypeId,
        value: ParamValue,
        part_type: PartTypeId,
    ) -> Result<Vec<NomenclatureId>>;
}

/// Current region state
pub trait RegionConfigStore: Send + Sync {
    fn region(&self, region: RegionId) -> Result<Option<RegionRow>>;

    /// Parameter rows ordered by ascending priority, then row id
    fn region_params(&self, region: RegionId) -> Result<Vec<RegionParamRow>>;

    /// Part rows of every component in the region, ordered by row id
    fn region_parts(&self, region: RegionId) -> Result<Vec<RegionPartRow>>;
}

/// Atomic writer for resolved configurations
pub trait RegionConfigWriter: Send + Sync {
    /// Apply every update in one transaction.
    ///
    /// A missing target row fails the whole batch; nothing is applied.
    fn apply_update(&self, region: RegionId, update: &ConfigUpdate) -> Result<()>;
}

/// Region lifecycle
pub trait RegionRepository: Send + Sync {
    /// Insert the region with catalog-default parameter, component and
    /// part rows
    fn create_region(&self, region: &NewRegion) -> Result<RegionId>;

    /// Delete the region and all its rows; `false` if it did not exist
    fn delete_region(&self, region: RegionId) -> Result<bool>;

    fn count_regions(&self, project_id: i64, region_type: RegionTypeId) -> Result<usize>;

    fn nomenclature_names(&self, ids: &[NomenclatureId])
        -> Result<HashMap<NomenclatureId, String>>;
}

/// One-time catalog seeding and nomenclature import
pub trait CatalogBootstrap: Send + Sync {
    fn is_bootstrapped(&self) -> Result<bool>;

    fn bootstrap(&self, seed: &CatalogSeed) -> Result<()>;

    fn import_nomenclature(&self, import: &NomenclatureImport) -> Result<()>;
}

/// Everything a region service needs from one backend
pub trait ConfigStore:
    CompatibilityStore + RegionConfigStore + RegionConfigWriter + RegionRepository + CatalogBootstrap
{
}

impl<T> ConfigStore for T where
    T: CompatibilityStore
        + RegionConfigStore
        + RegionConfigWriter
        + RegionRepository
        + CatalogBootstrap
{
}
