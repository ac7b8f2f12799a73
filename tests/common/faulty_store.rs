//! Fault-injecting wrapper around `MemoryStore`

use artifact_registry::store::{
    ArtifactPage, Attribution, ListOperationOptions, StoreArtifact, StoreContext, TypeDef,
};
use artifact_registry::{MemoryStore, MetadataStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Delegates to an inner `MemoryStore` unless a fault is switched on
#[derive(Default)]
pub struct FaultyStore {
    pub inner: Arc<MemoryStore>,
    /// `put_attributions` fails with `Unavailable`
    pub fail_attributions: AtomicBool,
    /// `get_artifacts_by_type` returns every match twice
    pub duplicate_type_results: AtomicBool,
    /// `get_artifacts_by_id` returns every match twice
    pub duplicate_id_results: AtomicBool,
    /// `put_artifacts` reports an extra id
    pub extra_write_ids: AtomicBool,
    pub artifact_writes: AtomicUsize,
    pub attribution_writes: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }

    pub fn artifact_writes(&self) -> usize {
        self.artifact_writes.load(Ordering::SeqCst)
    }

    pub fn attribution_writes(&self) -> usize {
        self.attribution_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataStore for FaultyStore {
    async fn put_artifact_type(&self, ty: &TypeDef) -> StoreResult<i64> {
        self.inner.put_artifact_type(ty).await
    }

    async fn put_context_type(&self, ty: &TypeDef) -> StoreResult<i64> {
        self.inner.put_context_type(ty).await
    }

    async fn put_artifacts(&self, artifacts: Vec<StoreArtifact>) -> StoreResult<Vec<i64>> {
        self.artifact_writes.fetch_add(1, Ordering::SeqCst);
        let mut ids = self.inner.put_artifacts(artifacts).await?;
        if self.extra_write_ids.load(Ordering::SeqCst) {
            ids.push(i64::MAX);
        }
        Ok(ids)
    }

    async fn put_contexts(&self, contexts: Vec<StoreContext>) -> StoreResult<Vec<i64>> {
        self.inner.put_contexts(contexts).await
    }

    async fn put_attributions(&self, attributions: Vec<Attribution>) -> StoreResult<()> {
        self.attribution_writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_attributions.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("attribution write dropped".into()));
        }
        self.inner.put_attributions(attributions).await
    }

    async fn get_artifacts_by_id(&self, ids: &[i64]) -> StoreResult<Vec<StoreArtifact>> {
        let found = self.inner.get_artifacts_by_id(ids).await?;
        if self.duplicate_id_results.load(Ordering::SeqCst) {
            return Ok(found.into_iter().flat_map(|a| [a.clone(), a]).collect());
        }
        Ok(found)
    }

    async fn get_artifacts_by_context(
        &self,
        context_id: i64,
        options: &ListOperationOptions,
    ) -> StoreResult<ArtifactPage> {
        self.inner.get_artifacts_by_context(context_id, options).await
    }

    async fn get_artifacts_by_type(
        &self,
        type_name: &str,
        options: &ListOperationOptions,
    ) -> StoreResult<ArtifactPage> {
        let mut page = self.inner.get_artifacts_by_type(type_name, options).await?;
        if self.duplicate_type_results.load(Ordering::SeqCst) {
            page.artifacts = page
                .artifacts
                .into_iter()
                .flat_map(|a| [a.clone(), a])
                .collect();
        }
        Ok(page)
    }

    async fn get_contexts_by_id(&self, ids: &[i64]) -> StoreResult<Vec<StoreContext>> {
        self.inner.get_contexts_by_id(ids).await
    }

    async fn get_contexts_by_artifact(&self, artifact_id: i64) -> StoreResult<Vec<StoreContext>> {
        self.inner.get_contexts_by_artifact(artifact_id).await
    }
}
