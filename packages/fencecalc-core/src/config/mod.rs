//! Configuration
//!
//! `FenceConfig` is built from defaults, an optional YAML file (schema v1)
//! and `FENCECALC_*` environment variables, with field-level provenance.
//!
//! ```rust,ignore
//! use fencecalc_core::config::FenceConfig;
//!
//! let config = FenceConfig::load(Some(Path::new("fencecalc.yaml")))?;
//! ```

pub mod error;
pub mod fence_config;
pub mod io;
pub mod provenance;
pub mod tie_break;

// Re-exports
pub use error::{ConfigError, ConfigResult};
pub use fence_config::{FenceConfig, ENV_DB, ENV_LOG, ENV_TIE_BREAK};
pub use io::ConfigExportV1;
pub use provenance::{ConfigProvenance, ConfigSource};
pub use tie_break::TieBreak;
