/*
 * fencecalc - fence configuration resolver
 *
 * Feature-First Hexagonal Architecture:
 * - shared/   : FenceError and Result
 * - config/   : FenceConfig (YAML + env), tie-break rule, provenance
 * - features/ : catalog → resolution → region
 *
 * Storage ports and adapters live in the fencecalc-storage crate.
 */

#![allow(clippy::new_without_default)] // Builders start from new()
#![allow(clippy::unnecessary_map_or)] // map_or style for nullable ids

pub mod config;
pub mod features;
pub mod shared;

pub use config::{ConfigError, FenceConfig, TieBreak};
pub use features::catalog::{Catalog, ControlHint, ControlKind};
pub use features::region::{ParamView, PartView, RegionService, RegionView};
pub use features::resolution::{
    ConfigWriter, Overrides, ResolvedParam, ResolvedPart, Resolution, Resolver,
};
pub use shared::{ErrorKind, FenceError, Result};
