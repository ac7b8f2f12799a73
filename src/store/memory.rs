//! In-memory metadata store
//!
//! A reference implementation of [`MetadataStore`] used by tests and the
//! developer CLI. Reads go straight to `DashMap` tables; writes are
//! serialized behind an async mutex so uniqueness checks and id assignment
//! see a consistent view. State can be snapshotted to a JSON file.

use super::filter::{FilterField, FilterQuery};
use super::traits::{MetadataStore, StoreError, StoreResult};
use super::types::{
    ArtifactPage, Attribution, ListOperationOptions, OrderField, Properties, StoreArtifact,
    StoreContext, TypeDef,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::Mutex;

/// Page size used when a list call does not ask for one
pub const DEFAULT_PAGE_SIZE: usize = 20;

const PAGE_TOKEN_PREFIX: &str = "offset:";

/// A registered type and its assigned id
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegisteredType {
    id: i64,
    def: TypeDef,
}

/// On-disk form of the whole store
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    artifact_types: Vec<RegisteredType>,
    context_types: Vec<RegisteredType>,
    artifacts: Vec<StoreArtifact>,
    contexts: Vec<StoreContext>,
    attributions: Vec<Attribution>,
}

/// DashMap-backed metadata store
#[derive(Debug)]
pub struct MemoryStore {
    artifact_types: DashMap<String, RegisteredType>,
    context_types: DashMap<String, RegisteredType>,
    artifacts: DashMap<i64, StoreArtifact>,
    contexts: DashMap<i64, StoreContext>,
    /// Context id -> attributed artifact ids
    attributions: DashMap<i64, BTreeSet<i64>>,
    next_type_id: AtomicI64,
    next_artifact_id: AtomicI64,
    next_context_id: AtomicI64,
    writes: Mutex<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            artifact_types: DashMap::new(),
            context_types: DashMap::new(),
            artifacts: DashMap::new(),
            contexts: DashMap::new(),
            attributions: DashMap::new(),
            next_type_id: AtomicI64::new(1),
            next_artifact_id: AtomicI64::new(1),
            next_context_id: AtomicI64::new(1),
            writes: Mutex::new(()),
        }
    }

    /// Load a store from a snapshot file, or start empty if the file is missing
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let raw = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the current state to a snapshot file
    pub fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        let mut max_type = 0;
        for t in snapshot.artifact_types {
            max_type = max_type.max(t.id);
            store.artifact_types.insert(t.def.name.clone(), t);
        }
        for t in snapshot.context_types {
            max_type = max_type.max(t.id);
            store.context_types.insert(t.def.name.clone(), t);
        }
        let mut max_artifact = 0;
        for a in snapshot.artifacts {
            if let Some(id) = a.id {
                max_artifact = max_artifact.max(id);
                store.artifacts.insert(id, a);
            }
        }
        let mut max_context = 0;
        for c in snapshot.contexts {
            if let Some(id) = c.id {
                max_context = max_context.max(id);
                store.contexts.insert(id, c);
            }
        }
        for a in snapshot.attributions {
            store
                .attributions
                .entry(a.context_id)
                .or_default()
                .insert(a.artifact_id);
        }
        store.next_type_id.store(max_type + 1, Ordering::SeqCst);
        store.next_artifact_id.store(max_artifact + 1, Ordering::SeqCst);
        store.next_context_id.store(max_context + 1, Ordering::SeqCst);
        store
    }

    fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot {
            artifact_types: self.artifact_types.iter().map(|r| r.value().clone()).collect(),
            context_types: self.context_types.iter().map(|r| r.value().clone()).collect(),
            artifacts: self.artifacts.iter().map(|r| r.value().clone()).collect(),
            contexts: self.contexts.iter().map(|r| r.value().clone()).collect(),
            attributions: self
                .attributions
                .iter()
                .flat_map(|r| {
                    let context_id = *r.key();
                    r.value()
                        .iter()
                        .map(move |&artifact_id| Attribution {
                            context_id,
                            artifact_id,
                        })
                        .collect::<Vec<_>>()
                })
                .collect(),
        };
        // Stable output for diffs
        snapshot.artifact_types.sort_by_key(|t| t.id);
        snapshot.context_types.sort_by_key(|t| t.id);
        snapshot.artifacts.sort_by_key(|a| a.id);
        snapshot.contexts.sort_by_key(|c| c.id);
        snapshot
            .attributions
            .sort_by_key(|a| (a.context_id, a.artifact_id));
        snapshot
    }

    /// Number of stored artifacts
    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    /// Number of stored attribution edges
    pub fn attribution_count(&self) -> usize {
        self.attributions.iter().map(|r| r.value().len()).sum()
    }

    /// Check whether an attribution edge exists
    pub fn has_attribution(&self, context_id: i64, artifact_id: i64) -> bool {
        self.attributions
            .get(&context_id)
            .map(|set| set.contains(&artifact_id))
            .unwrap_or(false)
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn register(&self, table: &DashMap<String, RegisteredType>, ty: &TypeDef) -> StoreResult<i64> {
        if ty.name.trim().is_empty() {
            return Err(StoreError::InvalidArgument("type name must not be empty".into()));
        }
        if let Some(existing) = table.get(&ty.name) {
            if existing.def.properties != ty.properties {
                return Err(StoreError::AlreadyExists(format!(
                    "type '{}' already registered with different properties",
                    ty.name
                )));
            }
            return Ok(existing.id);
        }
        let id = self.next_type_id.fetch_add(1, Ordering::SeqCst);
        table.insert(
            ty.name.clone(),
            RegisteredType {
                id,
                def: ty.clone(),
            },
        );
        Ok(id)
    }

    fn resolve_type(
        table: &DashMap<String, RegisteredType>,
        type_id: Option<i64>,
        type_name: Option<&str>,
    ) -> StoreResult<RegisteredType> {
        let found = match (type_id, type_name) {
            (Some(id), _) => table.iter().find(|r| r.value().id == id).map(|r| r.value().clone()),
            (None, Some(name)) => table.get(name).map(|r| r.value().clone()),
            (None, None) => {
                return Err(StoreError::InvalidArgument("record carries no type".into()))
            }
        };
        found.ok_or_else(|| {
            StoreError::NotFound(format!(
                "type id={:?} name={:?} is not registered",
                type_id, type_name
            ))
        })
    }

    fn check_properties(ty: &RegisteredType, properties: &Properties) -> StoreResult<()> {
        for (key, value) in properties {
            match ty.def.properties.get(key) {
                Some(declared) if *declared == value.property_type() => {}
                Some(declared) => {
                    return Err(StoreError::InvalidArgument(format!(
                        "property '{}' of type '{}' must be {:?}",
                        key, ty.def.name, declared
                    )))
                }
                None => {
                    return Err(StoreError::InvalidArgument(format!(
                        "property '{}' is not declared by type '{}'",
                        key, ty.def.name
                    )))
                }
            }
        }
        Ok(())
    }

    fn page(
        &self,
        mut items: Vec<StoreArtifact>,
        options: &ListOperationOptions,
    ) -> StoreResult<ArtifactPage> {
        if let Some(raw) = options.filter_query.as_deref().filter(|q| !q.trim().is_empty()) {
            let query =
                FilterQuery::parse(raw).map_err(|e| StoreError::InvalidArgument(e.to_string()))?;
            items.retain(|a| matches_filter(a, &query));
        }

        let limit = match options.max_result_size {
            Some(n) if n <= 0 => {
                return Err(StoreError::InvalidArgument(format!(
                    "max_result_size must be positive, got {}",
                    n
                )))
            }
            Some(n) => n as usize,
            None => DEFAULT_PAGE_SIZE,
        };

        let order = options.order_by.unwrap_or_default();
        items.sort_by_key(|a| {
            let key = match order {
                OrderField::Id => a.id,
                OrderField::CreateTime => a.create_time_since_epoch,
                OrderField::LastUpdateTime => a.last_update_time_since_epoch,
            };
            (key, a.id)
        });
        if !options.is_asc.unwrap_or(true) {
            items.reverse();
        }

        let offset = match options.next_page_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => decode_page_token(token)?,
            None => 0,
        };

        let total = items.len();
        let artifacts: Vec<StoreArtifact> = items.into_iter().skip(offset).take(limit).collect();
        let consumed = offset + artifacts.len();
        let next_page_token = (consumed < total).then(|| format!("{}{}", PAGE_TOKEN_PREFIX, consumed));

        Ok(ArtifactPage {
            artifacts,
            next_page_token,
        })
    }
}

fn matches_filter(artifact: &StoreArtifact, query: &FilterQuery) -> bool {
    let field = match query.field {
        FilterField::Name => artifact.name.as_deref(),
        FilterField::ExternalId => artifact.external_id.as_deref(),
        FilterField::Type => artifact.type_name.as_deref(),
    };
    field == Some(query.value.as_str())
}

fn decode_page_token(token: &str) -> StoreResult<usize> {
    token
        .strip_prefix(PAGE_TOKEN_PREFIX)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| StoreError::InvalidArgument(format!("invalid page token '{}'", token)))
}

/// The fields a uniqueness check looks at
struct Identity<'a> {
    id: Option<i64>,
    type_id: Option<i64>,
    name: Option<&'a str>,
    external_id: Option<&'a str>,
}

impl<'a> Identity<'a> {
    fn of_artifact(a: &'a StoreArtifact) -> Self {
        Self {
            id: a.id,
            type_id: a.type_id,
            name: a.name.as_deref(),
            external_id: a.external_id.as_deref(),
        }
    }

    fn of_context(c: &'a StoreContext) -> Self {
        Self {
            id: c.id,
            type_id: c.type_id,
            name: c.name.as_deref(),
            external_id: c.external_id.as_deref(),
        }
    }

    /// (type, name) and (type, external_id) must be unique
    fn clash(&self, other: &Identity<'_>) -> Option<String> {
        if self.type_id != other.type_id || (self.id.is_some() && self.id == other.id) {
            return None;
        }
        match (self.name, self.external_id) {
            (Some(name), _) if other.name == Some(name) => Some(format!("name '{}'", name)),
            (_, Some(ext)) if other.external_id == Some(ext) => {
                Some(format!("external_id '{}'", ext))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn put_artifact_type(&self, ty: &TypeDef) -> StoreResult<i64> {
        let _guard = self.writes.lock().await;
        self.register(&self.artifact_types, ty)
    }

    async fn put_context_type(&self, ty: &TypeDef) -> StoreResult<i64> {
        let _guard = self.writes.lock().await;
        self.register(&self.context_types, ty)
    }

    async fn put_artifacts(&self, artifacts: Vec<StoreArtifact>) -> StoreResult<Vec<i64>> {
        let _guard = self.writes.lock().await;
        let now = Utc::now().timestamp_millis();

        let mut prepared: Vec<StoreArtifact> = Vec::with_capacity(artifacts.len());
        for mut artifact in artifacts {
            let ty = Self::resolve_type(
                &self.artifact_types,
                artifact.type_id,
                artifact.type_name.as_deref(),
            )?;
            Self::check_properties(&ty, &artifact.properties)?;
            artifact.type_id = Some(ty.id);
            artifact.type_name = Some(ty.def.name.clone());

            match artifact.id {
                Some(id) => {
                    let existing = self
                        .artifacts
                        .get(&id)
                        .ok_or_else(|| StoreError::NotFound(format!("artifact {}", id)))?;
                    if existing.type_id != artifact.type_id {
                        return Err(StoreError::InvalidArgument(format!(
                            "artifact {} cannot change type from {:?} to {:?}",
                            id, existing.type_name, artifact.type_name
                        )));
                    }
                    artifact.create_time_since_epoch = existing.create_time_since_epoch;
                }
                None => artifact.create_time_since_epoch = Some(now),
            }
            artifact.last_update_time_since_epoch = Some(now);

            let identity = Identity::of_artifact(&artifact);
            let clash = self
                .artifacts
                .iter()
                .find_map(|r| identity.clash(&Identity::of_artifact(r.value())))
                .or_else(|| {
                    prepared
                        .iter()
                        .find_map(|other| identity.clash(&Identity::of_artifact(other)))
                });
            if let Some(what) = clash {
                return Err(StoreError::AlreadyExists(format!(
                    "artifact of type '{}' with {}",
                    ty.def.name, what
                )));
            }
            prepared.push(artifact);
        }

        let mut ids = Vec::with_capacity(prepared.len());
        for mut artifact in prepared {
            let id = match artifact.id {
                Some(id) => id,
                None => self.next_artifact_id.fetch_add(1, Ordering::SeqCst),
            };
            artifact.id = Some(id);
            self.artifacts.insert(id, artifact);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn put_contexts(&self, contexts: Vec<StoreContext>) -> StoreResult<Vec<i64>> {
        let _guard = self.writes.lock().await;
        let now = Utc::now().timestamp_millis();

        let mut prepared: Vec<StoreContext> = Vec::with_capacity(contexts.len());
        for mut context in contexts {
            let ty = Self::resolve_type(
                &self.context_types,
                context.type_id,
                context.type_name.as_deref(),
            )?;
            Self::check_properties(&ty, &context.properties)?;
            context.type_id = Some(ty.id);
            context.type_name = Some(ty.def.name.clone());

            match context.id {
                Some(id) => {
                    let existing = self
                        .contexts
                        .get(&id)
                        .ok_or_else(|| StoreError::NotFound(format!("context {}", id)))?;
                    if existing.type_id != context.type_id {
                        return Err(StoreError::InvalidArgument(format!(
                            "context {} cannot change type",
                            id
                        )));
                    }
                    context.create_time_since_epoch = existing.create_time_since_epoch;
                }
                None => context.create_time_since_epoch = Some(now),
            }
            context.last_update_time_since_epoch = Some(now);

            let identity = Identity::of_context(&context);
            let clash = self
                .contexts
                .iter()
                .find_map(|r| identity.clash(&Identity::of_context(r.value())))
                .or_else(|| {
                    prepared
                        .iter()
                        .find_map(|other| identity.clash(&Identity::of_context(other)))
                });
            if let Some(what) = clash {
                return Err(StoreError::AlreadyExists(format!(
                    "context of type '{}' with {}",
                    ty.def.name, what
                )));
            }
            prepared.push(context);
        }

        let mut ids = Vec::with_capacity(prepared.len());
        for mut context in prepared {
            let id = match context.id {
                Some(id) => id,
                None => self.next_context_id.fetch_add(1, Ordering::SeqCst),
            };
            context.id = Some(id);
            self.contexts.insert(id, context);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn put_attributions(&self, attributions: Vec<Attribution>) -> StoreResult<()> {
        let _guard = self.writes.lock().await;
        for a in &attributions {
            if !self.contexts.contains_key(&a.context_id) {
                return Err(StoreError::NotFound(format!("context {}", a.context_id)));
            }
            if !self.artifacts.contains_key(&a.artifact_id) {
                return Err(StoreError::NotFound(format!("artifact {}", a.artifact_id)));
            }
        }
        for a in attributions {
            self.attributions
                .entry(a.context_id)
                .or_default()
                .insert(a.artifact_id);
        }
        Ok(())
    }

    async fn get_artifacts_by_id(&self, ids: &[i64]) -> StoreResult<Vec<StoreArtifact>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.artifacts.get(id).map(|r| r.value().clone()))
            .collect())
    }

    async fn get_artifacts_by_context(
        &self,
        context_id: i64,
        options: &ListOperationOptions,
    ) -> StoreResult<ArtifactPage> {
        let members: Vec<i64> = self
            .attributions
            .get(&context_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        let items = members
            .iter()
            .filter_map(|id| self.artifacts.get(id).map(|r| r.value().clone()))
            .collect();
        self.page(items, options)
    }

    async fn get_artifacts_by_type(
        &self,
        type_name: &str,
        options: &ListOperationOptions,
    ) -> StoreResult<ArtifactPage> {
        let items = self
            .artifacts
            .iter()
            .filter(|r| r.value().type_name.as_deref() == Some(type_name))
            .map(|r| r.value().clone())
            .collect();
        self.page(items, options)
    }

    async fn get_contexts_by_id(&self, ids: &[i64]) -> StoreResult<Vec<StoreContext>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.contexts.get(id).map(|r| r.value().clone()))
            .collect())
    }

    async fn get_contexts_by_artifact(&self, artifact_id: i64) -> StoreResult<Vec<StoreContext>> {
        let mut owners: Vec<i64> = self
            .attributions
            .iter()
            .filter(|r| r.value().contains(&artifact_id))
            .map(|r| *r.key())
            .collect();
        owners.sort_unstable();
        Ok(owners
            .iter()
            .filter_map(|id| self.contexts.get(id).map(|r| r.value().clone()))
            .collect())
    }
}
