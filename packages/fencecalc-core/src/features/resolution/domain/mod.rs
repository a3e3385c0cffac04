mod models;

pub use models::{Overrides, ResolvedParam, ResolvedPart, Resolution};
