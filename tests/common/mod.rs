//! Shared fixtures for registry integration tests

#![allow(dead_code)]

pub mod faulty_store;

pub use faulty_store::FaultyStore;

use artifact_registry::{ArtifactService, RegistryConfig};
use std::sync::Arc;

/// A service wired to a fault-injecting in-memory store
pub struct Harness {
    pub store: Arc<FaultyStore>,
    pub service: ArtifactService,
}

pub async fn harness() -> Harness {
    harness_with(&RegistryConfig::default()).await
}

pub async fn harness_with(config: &RegistryConfig) -> Harness {
    let store = Arc::new(FaultyStore::new());
    let service = ArtifactService::connect(store.clone(), config)
        .await
        .expect("type registration");
    Harness { store, service }
}
