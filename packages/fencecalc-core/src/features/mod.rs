//! Vertical slices
//!
//! - `catalog`: static parameter/part catalog, seeding and validation
//! - `resolution`: resolver and atomic writer
//! - `region`: region lifecycle service and enriched views

pub mod catalog;
pub mod region;
pub mod resolution;
