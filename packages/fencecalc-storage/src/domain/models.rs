//! Storage Domain Models
//!
//! Typed ids, parameter values and the row shapes exchanged with the
//! storage ports. Catalog rows (`CatalogSeed`) are written once at
//! bootstrap; region rows are created per region and mutated only through
//! `ConfigUpdate`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Region instance (a physical fence segment of a project)
    RegionId
);
id_type!(
    /// Region type (`tregion`)
    RegionTypeId
);
id_type!(
    /// Parameter type (`tparam`)
    ParamTypeId
);
id_type!(
    /// Component type (`tcomponent`)
    ComponentTypeId
);
id_type!(
    /// Component instance within a region (`component`)
    ComponentId
);
id_type!(
    /// Part type, a bill-of-materials line of a component type (`tpart`)
    PartTypeId
);
id_type!(
    /// Concrete catalog item (`nomenclature`)
    NomenclatureId
);

/// Numeric parameter value.
///
/// Wraps an `f64` with total ordering, equality and hashing so values can
/// key ordered maps. `-0.0` is normalized to `0.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamValue(f64);

impl ParamValue {
    /// "No valid value under current constraints"
    pub const UNAVAILABLE: ParamValue = ParamValue(-1.0);

    pub fn new(value: f64) -> Self {
        if value == 0.0 {
            Self(0.0)
        } else {
            Self(value)
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }

    pub fn is_unavailable(self) -> bool {
        self == Self::UNAVAILABLE
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for ParamValue {}

impl Hash for ParamValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for ParamValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParamValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Catalog rows
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTypeRow {
    pub id: RegionTypeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamTypeRow {
    pub id: ParamTypeId,
    /// Lower resolves first
    pub priority: i32,
    pub name: String,
    pub description: String,
}

/// One declared value of a parameter type (`tparamvalue`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamValueRow {
    pub param_type: ParamTypeId,
    pub value: ParamValue,
    pub label: String,
}

/// Param → param compatibility edge (`cn_tparamvalue_tparamvalue`).
///
/// `dependent_value == ParamValue::UNAVAILABLE` means the dependent
/// parameter has no valid value while the source holds `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamEdge {
    pub param_type: ParamTypeId,
    pub value: ParamValue,
    pub dependent_type: ParamTypeId,
    pub dependent_value: ParamValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentTypeRow {
    pub id: ComponentTypeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartTypeRow {
    pub id: PartTypeId,
    pub component_type: ComponentTypeId,
    pub name: String,
}

/// Everything the static catalog contributes to storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeed {
    pub region_types: Vec<RegionTypeRow>,
    pub param_types: Vec<ParamTypeRow>,
    pub param_values: Vec<ParamValueRow>,
    /// Which region types instantiate which parameter types
    pub param_regions: Vec<(ParamTypeId, RegionTypeId)>,
    pub param_edges: Vec<ParamEdge>,
    pub component_types: Vec<ComponentTypeRow>,
    pub part_types: Vec<PartTypeRow>,
    pub region_components: Vec<(RegionTypeId, ComponentTypeId)>,
    /// Param → part linkage (`cn_tparam_tpart`)
    pub param_parts: Vec<(ParamTypeId, PartTypeId)>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Nomenclature
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NomenclatureRow {
    pub id: NomenclatureId,
    pub name: String,
    #[serde(default)]
    pub vendor_code: String,
}

/// Param → nomenclature compatibility edge (`cn_tparamvalue_nomenclature`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NomenclatureEdge {
    pub param_type: ParamTypeId,
    pub value: ParamValue,
    pub nomenclature: NomenclatureId,
}

/// Nomenclature items plus the edges referencing them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NomenclatureImport {
    pub nomenclature: Vec<NomenclatureRow>,
    /// Generic allowed set per part type (`cn_tpart_nomenclature`);
    /// `None` allows "no nomenclature"
    pub part_nomenclature: Vec<(PartTypeId, Option<NomenclatureId>)>,
    pub param_nomenclature: Vec<NomenclatureEdge>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Region state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRow {
    pub id: RegionId,
    pub project_id: i64,
    pub region_type: RegionTypeId,
    pub description: String,
    pub nr: i64,
    pub created_at: DateTime<Utc>,
}

/// Insert request for a region; parameter and part rows are defaulted
/// from the catalog tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegion {
    pub project_id: i64,
    pub region_type: RegionTypeId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nr: i64,
}

/// Current value of one parameter of a region, joined with its priority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionParamRow {
    pub param_type: ParamTypeId,
    pub priority: i32,
    pub value: ParamValue,
}

/// Current nomenclature of one part of a component in a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionPartRow {
    pub part_type: PartTypeId,
    pub component: ComponentId,
    pub nomenclature: Option<NomenclatureId>,
}

/// Batch of region updates applied atomically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub params: Vec<(ParamTypeId, ParamValue)>,
    /// Applied to every part of the given type within the region
    pub parts: Vec<(PartTypeId, Option<NomenclatureId>)>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.parts.is_empty()
    }
}
