//! Configuration provenance tracking
//!
//! Track where each configuration value came from (default, YAML, env)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Built-in default
    Default,

    /// From YAML file
    Yaml { path: String },

    /// From environment variable
    Env(String),

    /// From a command-line flag
    Cli(String),
}

impl ConfigSource {
    pub fn describe(&self) -> String {
        match self {
            ConfigSource::Default => "default".to_string(),
            ConfigSource::Yaml { path } => path.clone(),
            ConfigSource::Env(var) => format!("env ${}", var),
            ConfigSource::Cli(flag) => format!("flag {}", flag),
        }
    }
}

/// Field name → source of its current value; unlisted fields are defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigProvenance {
    field_sources: BTreeMap<String, ConfigSource>,
}

impl ConfigProvenance {
    pub fn track_field(&mut self, field: &str, source: ConfigSource) {
        self.field_sources.insert(field.to_string(), source);
    }

    pub fn get_source(&self, field: &str) -> &ConfigSource {
        self.field_sources
            .get(field)
            .unwrap_or(&ConfigSource::Default)
    }

    pub fn field_sources(&self) -> &BTreeMap<String, ConfigSource> {
        &self.field_sources
    }

    /// Get human-readable summary
    pub fn summary(&self) -> String {
        if self.field_sources.is_empty() {
            return "all fields: default".to_string();
        }
        self.field_sources
            .iter()
            .map(|(field, source)| format!("{} ← {}", field, source.describe()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking() {
        let mut provenance = ConfigProvenance::default();
        assert_eq!(provenance.get_source("tie_break"), &ConfigSource::Default);

        provenance.track_field(
            "tie_break",
            ConfigSource::Yaml {
                path: "fence.yaml".into(),
            },
        );
        provenance.track_field("database_path", ConfigSource::Env("FENCECALC_DB".into()));

        assert_eq!(
            provenance.summary(),
            "database_path ← env $FENCECALC_DB\ntie_break ← fence.yaml"
        );
    }
}
