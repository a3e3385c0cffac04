//! Region lifecycle: create, edit, view and delete fence regions

mod service;
mod view;

pub use service::RegionService;
pub use view::{NomenclatureOption, ParamView, PartView, RegionView, ValueOption};
