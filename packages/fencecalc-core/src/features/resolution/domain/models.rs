//! Resolution results and caller overrides

use std::collections::BTreeMap;

use serde::Serialize;

use fencecalc_storage::{ConfigUpdate, NomenclatureId, ParamTypeId, ParamValue, PartTypeId, RegionId};

/// Final value of one parameter and the values still allowed for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedParam {
    pub value: ParamValue,
    pub priority: i32,
    /// Surviving declared values with their labels
    pub candidates: BTreeMap<ParamValue, String>,
    /// At least one lower-priority parameter filtered the candidates
    pub constrained: bool,
}

impl ResolvedParam {
    pub fn is_unavailable(&self) -> bool {
        self.value.is_unavailable()
    }
}

/// Final nomenclature of one part type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPart {
    pub nomenclature: Option<NomenclatureId>,
    /// Ascending, `None` ("no nomenclature") first
    pub candidates: Vec<Option<NomenclatureId>>,
}

/// Consistent configuration of one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub region: RegionId,
    pub params: BTreeMap<ParamTypeId, ResolvedParam>,
    pub parts: BTreeMap<PartTypeId, ResolvedPart>,
}

impl Resolution {
    pub fn value(&self, param: ParamTypeId) -> Option<ParamValue> {
        self.params.get(&param).map(|p| p.value)
    }

    pub fn nomenclature(&self, part: PartTypeId) -> Option<NomenclatureId> {
        self.parts.get(&part).and_then(|p| p.nomenclature)
    }

    /// Every resolved value and selection as one storage batch
    pub fn to_update(&self) -> ConfigUpdate {
        ConfigUpdate {
            params: self.params.iter().map(|(id, p)| (*id, p.value)).collect(),
            parts: self
                .parts
                .iter()
                .map(|(id, p)| (*id, p.nomenclature))
                .collect(),
        }
    }
}

/// Caller-supplied values replacing the stored ones before resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub params: BTreeMap<ParamTypeId, ParamValue>,
    pub parts: BTreeMap<PartTypeId, NomenclatureId>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, id: ParamTypeId, value: impl Into<ParamValue>) -> Self {
        self.params.insert(id, value.into());
        self
    }

    pub fn part(mut self, id: PartTypeId, nomenclature: NomenclatureId) -> Self {
        self.parts.insert(id, nomenclature);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.parts.is_empty()
    }
}
