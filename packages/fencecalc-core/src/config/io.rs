//! Configuration I/O schema (YAML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::tie_break::TieBreak;

/// YAML Schema v1
///
/// Every field but `version` is optional; missing fields keep their
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tie_break: Option<TieBreak>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialize_region_edits: Option<bool>,

    /// tracing env-filter directive, e.g. `info,fencecalc_core=debug`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}
