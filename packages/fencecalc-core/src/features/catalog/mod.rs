//! Parameter catalog
//!
//! Declares region types, parameter types (values, priorities, dependent
//! constraints), component and part types, color schemes and the
//! parameter → part links. The catalog is an immutable value built once
//! (`Catalog::standard()`), validated, and turned into storage rows by
//! `Catalog::seed()` at bootstrap.
//!
//! # Usage
//!
//! ```ignore
//! let catalog = Catalog::standard();
//! catalog.validate()?;
//! store.bootstrap(&catalog.seed())?;
//! ```

mod control;
mod model;
mod seed;
pub mod standard;

pub use control::{ControlHint, ControlKind};
pub use model::{
    Catalog, ColorDecl, ColorScheme, ComponentDecl, ParamDecl, PartDecl, PartTypeRef,
    RegionTypeDecl, ValueDecl, ValueKind, NO_COLOR,
};
