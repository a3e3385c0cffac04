//! Error types for the fencecalc-core crate
//!
//! One error type for the resolver, the region service and the catalog.
//! Storage and configuration failures are wrapped with their source kept.

use std::fmt;

use fencecalc_storage::StorageError;

use crate::config::ConfigError;

/// Error kind categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied an unknown region/parameter/part id or a bad value
    Input,
    /// Storage backend failure (database, transaction, integrity)
    Storage,
    /// Inconsistent catalog declaration
    Catalog,
    /// Configuration errors
    Config,
    /// Internal errors (bugs)
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Input => "input",
            ErrorKind::Storage => "storage",
            ErrorKind::Catalog => "catalog",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Unified error type
#[derive(Debug)]
pub struct FenceError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl FenceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Input, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Catalog, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn is_input(&self) -> bool {
        self.kind == ErrorKind::Input
    }

    /// Kind of the wrapped storage error, if this error came from storage
    pub fn storage_kind(&self) -> Option<fencecalc_storage::ErrorKind> {
        self.source
            .as_ref()
            .and_then(|e| e.downcast_ref::<StorageError>())
            .map(|e| e.kind)
    }
}

impl fmt::Display for FenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for FenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, FenceError>;

impl From<StorageError> for FenceError {
    fn from(err: StorageError) -> Self {
        FenceError::storage(err.to_string()).with_source(err)
    }
}

impl From<ConfigError> for FenceError {
    fn from(err: ConfigError) -> Self {
        FenceError::config(err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for FenceError {
    fn from(err: serde_json::Error) -> Self {
        FenceError::internal(format!("JSON serialization error: {}", err)).with_source(err)
    }
}
