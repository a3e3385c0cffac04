//! Enriched region views returned to callers

use chrono::{DateTime, Utc};
use serde::Serialize;

use fencecalc_storage::{NomenclatureId, ParamTypeId, ParamValue, PartTypeId, RegionId, RegionTypeId};

use crate::features::catalog::ControlHint;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueOption {
    pub value: ParamValue,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamView {
    pub id: ParamTypeId,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub priority: i32,
    pub value: ParamValue,
    /// Label of the current value, when it is a declared one
    pub label: Option<String>,
    pub unavailable: bool,
    pub control: ControlHint,
    pub candidates: Vec<ValueOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NomenclatureOption {
    pub id: Option<NomenclatureId>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartView {
    pub id: PartTypeId,
    pub name: String,
    pub nomenclature: Option<NomenclatureId>,
    pub nomenclature_name: Option<String>,
    pub candidates: Vec<NomenclatureOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionView {
    pub id: RegionId,
    pub project_id: i64,
    pub region_type: RegionTypeId,
    pub region_type_name: String,
    pub description: String,
    pub nr: i64,
    pub created_at: DateTime<Utc>,
    pub params: Vec<ParamView>,
    pub parts: Vec<PartView>,
}

impl RegionView {
    pub fn param(&self, id: ParamTypeId) -> Option<&ParamView> {
        self.params.iter().find(|p| p.id == id)
    }

    pub fn part(&self, id: PartTypeId) -> Option<&PartView> {
        self.parts.iter().find(|p| p.id == id)
    }
}
