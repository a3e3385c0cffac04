//! Runtime configuration
//!
//! Layering: built-in defaults → YAML file (schema v1) → environment.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use super::error::{ConfigError, ConfigResult};
use super::io::ConfigExportV1;
use super::provenance::{ConfigProvenance, ConfigSource};
use super::tie_break::TieBreak;

pub const ENV_DB: &str = "FENCECALC_DB";
pub const ENV_LOG: &str = "FENCECALC_LOG";
pub const ENV_TIE_BREAK: &str = "FENCECALC_TIE_BREAK";

const SUPPORTED_VERSIONS: &[u32] = &[1];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FenceConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    pub tie_break: TieBreak,

    /// Run Resolve+Persist of one region under a per-region lock
    pub serialize_region_edits: bool,

    pub log_filter: String,

    #[serde(skip)]
    pub provenance: ConfigProvenance,
}

impl Default for FenceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("fencecalc.db"),
            tie_break: TieBreak::default(),
            serialize_region_edits: true,
            log_filter: "info".to_string(),
            provenance: ConfigProvenance::default(),
        }
    }
}

impl FenceConfig {
    /// Defaults, then `path` (if any), then environment overrides
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Parse YAML content; `origin` is recorded as the provenance of every
    /// field it sets
    pub fn from_yaml_str(content: &str, origin: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        // Version check
        let version = export.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let mut config = Self::default();
        let source = || ConfigSource::Yaml {
            path: origin.to_string(),
        };
        if let Some(database_path) = export.database_path {
            config.database_path = database_path;
            config.provenance.track_field("database_path", source());
        }
        if let Some(tie_break) = export.tie_break {
            config.tie_break = tie_break;
            config.provenance.track_field("tie_break", source());
        }
        if let Some(serialize) = export.serialize_region_edits {
            config.serialize_region_edits = serialize;
            config
                .provenance
                .track_field("serialize_region_edits", source());
        }
        if let Some(log_filter) = export.log_filter {
            config.log_filter = log_filter;
            config.provenance.track_field("log_filter", source());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: Some(1),
            database_path: Some(self.database_path.clone()),
            tie_break: Some(self.tie_break),
            serialize_region_edits: Some(self.serialize_region_edits),
            log_filter: Some(self.log_filter.clone()),
        };
        Ok(serde_yaml::to_string(&export)?)
    }

    /// Apply `FENCECALC_*` overrides from the process environment
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(path) = lookup(ENV_DB) {
            if path.trim().is_empty() {
                return Err(ConfigError::Env {
                    var: ENV_DB.to_string(),
                    message: "database path is empty".to_string(),
                });
            }
            self.database_path = PathBuf::from(path);
            self.provenance
                .track_field("database_path", ConfigSource::Env(ENV_DB.to_string()));
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
            self.provenance
                .track_field("log_filter", ConfigSource::Env(ENV_LOG.to_string()));
        }
        if let Some(rule) = lookup(ENV_TIE_BREAK) {
            self.tie_break = rule.parse().map_err(|e: ConfigError| ConfigError::Env {
                var: ENV_TIE_BREAK.to_string(),
                message: e.to_string(),
            })?;
            self.provenance
                .track_field("tie_break", ConfigSource::Env(ENV_TIE_BREAK.to_string()));
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::range(
                "database_path",
                "''",
                "Set a database file path.",
            ));
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::range(
                "log_filter",
                "''",
                "Use a tracing filter such as 'info'.",
            ));
        }
        if let Err(e) = EnvFilter::try_new(&self.log_filter) {
            return Err(ConfigError::range("log_filter", &self.log_filter, e.to_string()));
        }
        Ok(())
    }
}
