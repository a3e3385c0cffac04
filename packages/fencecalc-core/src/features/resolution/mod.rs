//! Configuration resolution
//!
//! # Architecture (Hexagonal)
//!
//! ```text
//! RegionService / CLI
//!           ↓
//! application/ (Resolver, ConfigWriter) ← Entry Point
//!           ↓
//! domain/ (Resolution, Overrides)
//!           ↓
//! fencecalc-storage ports (CompatibilityStore, RegionConfigStore, RegionConfigWriter)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let resolution = Resolver::new(&store, TieBreak::SmallestValue)
//!     .resolve(region, &Overrides::new().param(COLUMN_STEP_TYPE, 1.0))?;
//! ConfigWriter::new(&store).persist(region, &resolution)?;
//! ```

pub mod application;
pub mod domain;

pub use application::{ConfigWriter, Resolver};
pub use domain::{Overrides, ResolvedParam, ResolvedPart, Resolution};
