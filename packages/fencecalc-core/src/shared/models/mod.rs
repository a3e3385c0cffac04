//! Shared models

mod error;

pub use error::{ErrorKind, FenceError, Result};
