//! Metadata store contract

use super::types::{
    ArtifactPage, Attribution, ListOperationOptions, StoreArtifact, StoreContext, TypeDef,
};
use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a metadata store
///
/// These are the store's own semantics; callers pass them through unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store: not found: {0}")]
    NotFound(String),

    #[error("store: already exists: {0}")]
    AlreadyExists(String),

    #[error("store: invalid argument: {0}")]
    InvalidArgument(String),

    #[error("store: unavailable: {0}")]
    Unavailable(String),

    #[error("store: internal error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Typed request/response façade over the backing metadata store
///
/// Implementations must be thread-safe (Send + Sync); every call may block on
/// network I/O to the store.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    // === Type Operations ===

    /// Register an artifact type, returning its id (idempotent by name)
    async fn put_artifact_type(&self, ty: &TypeDef) -> StoreResult<i64>;

    /// Register a context type, returning its id (idempotent by name)
    async fn put_context_type(&self, ty: &TypeDef) -> StoreResult<i64>;

    // === Writes ===

    /// Create nodes without an id, update nodes with one.
    /// Returns one id per input node, in input order.
    async fn put_artifacts(&self, artifacts: Vec<StoreArtifact>) -> StoreResult<Vec<i64>>;

    /// Create or update contexts, same shape as `put_artifacts`
    async fn put_contexts(&self, contexts: Vec<StoreContext>) -> StoreResult<Vec<i64>>;

    /// Record attribution edges; an edge that already exists is a no-op
    async fn put_attributions(&self, attributions: Vec<Attribution>) -> StoreResult<()>;

    // === Artifact Reads ===

    /// Fetch artifacts by id; unknown ids are skipped
    async fn get_artifacts_by_id(&self, ids: &[i64]) -> StoreResult<Vec<StoreArtifact>>;

    /// Page through the artifacts attributed to a context
    async fn get_artifacts_by_context(
        &self,
        context_id: i64,
        options: &ListOperationOptions,
    ) -> StoreResult<ArtifactPage>;

    /// Page through the artifacts of a type, optionally filtered
    async fn get_artifacts_by_type(
        &self,
        type_name: &str,
        options: &ListOperationOptions,
    ) -> StoreResult<ArtifactPage>;

    // === Context Reads ===

    /// Fetch contexts by id; unknown ids are skipped
    async fn get_contexts_by_id(&self, ids: &[i64]) -> StoreResult<Vec<StoreContext>>;

    /// Contexts an artifact is attributed to
    async fn get_contexts_by_artifact(&self, artifact_id: i64) -> StoreResult<Vec<StoreContext>>;
}
