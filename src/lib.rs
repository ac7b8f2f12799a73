//! Artifact Registry: model registry artifacts over a typed metadata store
//!
//! Exposes model and document artifacts as REST-shaped resources while
//! persisting them as typed nodes in a generic metadata store. Artifacts are
//! owned by model versions (store contexts) through attribution edges.
//!
//! # Core Concepts
//!
//! - **Artifacts**: a tagged union of model and doc artifacts
//! - **Model versions**: contexts every artifact is attached to at creation
//! - **Store**: the `MetadataStore` trait, with an in-memory implementation
//!
//! # Example
//!
//! ```
//! use artifact_registry::{ArtifactService, MemoryStore, RegistryConfig};
//! use std::sync::Arc;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let store = Arc::new(MemoryStore::new());
//!     let service = ArtifactService::connect(store, &RegistryConfig::default())
//!         .await
//!         .unwrap();
//!     let version = service.create_model_version("v1").await.unwrap();
//!     assert_eq!(version, "1");
//! });
//! ```

pub mod config;
pub mod convert;
pub mod model;
pub mod service;
pub mod store;

pub use config::{ConfigError, RegistryConfig, TypeNames};
pub use model::{
    Artifact, ArtifactKind, ArtifactList, ArtifactState, DocArtifact, ListOptions, ListResponse,
    MetadataValue, ModelArtifact, OrderBy, SortOrder,
};
pub use service::{ArtifactService, ReconcileReport, RegistryError, RegistryResult};
pub use store::{MemoryStore, MetadataStore, StoreError, StoreResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
