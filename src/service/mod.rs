//! Artifact service: upsert and lookup over a metadata store

mod artifacts;
mod reconcile;

pub use artifacts::ArtifactService;
pub use reconcile::ReconcileReport;

use crate::convert::MappingError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced to registry callers
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Store failures pass through unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<MappingError> for RegistryError {
    fn from(e: MappingError) -> Self {
        RegistryError::InvalidArgument(e.to_string())
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
