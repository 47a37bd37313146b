//! Error types for the fleet registry core.

use thiserror::Error;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can originate in the registry store.
///
/// The core performs no I/O, so this is the whole taxonomy: a caller
/// either registers a duplicate device or references an unknown entity.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("device already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),
}
