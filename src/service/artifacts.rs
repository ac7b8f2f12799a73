//! Artifact upsert and lookup
//!
//! Every operation is a short sequence of awaited store calls. Validation
//! runs before the first write; the node write and the attribution write
//! that follows it on create are not atomic.

use super::{RegistryError, RegistryResult};
use crate::config::RegistryConfig;
use crate::convert::{
    apply_update, artifact_type_def, id, model_version_type_def, name, ArtifactMapper, Mappable,
    RegisteredTypes, TypeRef, Updatable,
};
use crate::model::{
    Artifact, ArtifactList, DocArtifact, ListOptions, ListResponse, ModelArtifact, OrderBy,
    SortOrder,
};
use crate::store::{
    Attribution, FilterQuery, ListOperationOptions, MetadataStore, OrderField, StoreArtifact,
    StoreContext, StoreError,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registry façade over a metadata store
///
/// Holds no mutable state; clone the `Arc` around it to share.
pub struct ArtifactService {
    pub(super) store: Arc<dyn MetadataStore>,
    pub(super) mapper: ArtifactMapper,
    pub(super) reconcile_page_size: i32,
}

/// Outcome of validating an upsert, before anything is written
struct Prepared<K> {
    record: K,
    owner: i64,
    creating: bool,
}

impl ArtifactService {
    /// Register the registry's types in `store` and build a service over it
    pub async fn connect(
        store: Arc<dyn MetadataStore>,
        config: &RegistryConfig,
    ) -> RegistryResult<Self> {
        let names = &config.type_names;
        let model_artifact = store
            .put_artifact_type(&artifact_type_def::<ModelArtifact>(&names.model_artifact))
            .await?;
        let doc_artifact = store
            .put_artifact_type(&artifact_type_def::<DocArtifact>(&names.doc_artifact))
            .await?;
        let model_version = store
            .put_context_type(&model_version_type_def(&names.model_version))
            .await?;

        let types = RegisteredTypes {
            model_artifact: TypeRef {
                id: model_artifact,
                name: names.model_artifact.clone(),
            },
            doc_artifact: TypeRef {
                id: doc_artifact,
                name: names.doc_artifact.clone(),
            },
            model_version: TypeRef {
                id: model_version,
                name: names.model_version.clone(),
            },
        };
        debug!(?types, "registered store types");

        Ok(Self {
            store,
            mapper: ArtifactMapper::new(types),
            reconcile_page_size: config.reconcile_page_size,
        })
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    pub fn types(&self) -> &RegisteredTypes {
        self.mapper.types()
    }

    /// Create an empty model version context, returning its id
    pub async fn create_model_version(&self, version_name: &str) -> RegistryResult<String> {
        let ty = &self.types().model_version;
        let context = StoreContext {
            type_id: Some(ty.id),
            type_name: Some(ty.name.clone()),
            name: Some(version_name.to_string()),
            ..Default::default()
        };
        let ids = self.store.put_contexts(vec![context]).await?;
        let created = single_id(ids, "put_contexts")?;
        info!(model_version_id = created, name = version_name, "created model version");
        Ok(id::encode(created))
    }

    // === Upsert ===

    /// Create (no id) or update (id present) an artifact of either kind
    pub async fn upsert_artifact(
        &self,
        artifact: Artifact,
        model_version_id: Option<&str>,
    ) -> RegistryResult<Artifact> {
        debug!(kind = %artifact.kind(), id = ?artifact.id(), "upserting artifact");
        match artifact {
            Artifact::Model(a) => self.upsert_typed(a, model_version_id).await.map(Artifact::Model),
            Artifact::Doc(a) => self.upsert_typed(a, model_version_id).await.map(Artifact::Doc),
        }
    }

    /// Upsert a record of a known kind
    pub async fn upsert_typed<K: Mappable + Updatable>(
        &self,
        record: K,
        model_version_id: Option<&str>,
    ) -> RegistryResult<K> {
        let prepared = match record.id().map(str::to_string) {
            None => self.prepare_create(record, model_version_id).await?,
            Some(raw) => self.prepare_update(&raw, record, model_version_id).await?,
        };

        let node = self.mapper.map_from_kind(&prepared.record, Some(prepared.owner))?;
        let ids = self.store.put_artifacts(vec![node]).await?;
        let artifact_id = single_id(ids, "put_artifacts")?;

        if prepared.creating {
            let edge = Attribution {
                context_id: prepared.owner,
                artifact_id,
            };
            if let Err(e) = self.store.put_attributions(vec![edge]).await {
                warn!(
                    artifact_id,
                    model_version_id = prepared.owner,
                    error = %e,
                    "attribution write failed, artifact is left without a model version"
                );
                return Err(e.into());
            }
        }

        self.get_typed_by_id(&id::encode(artifact_id)).await
    }

    async fn prepare_create<K: Mappable + Updatable>(
        &self,
        mut record: K,
        model_version_id: Option<&str>,
    ) -> RegistryResult<Prepared<K>> {
        let raw = model_version_id.ok_or_else(|| {
            RegistryError::InvalidArgument(format!(
                "missing model version id, cannot create {} without a model version",
                K::KIND
            ))
        })?;
        let owner = id::decode(raw)?;
        self.ensure_model_version(owner).await?;
        record.clear_not_editable();

        info!(kind = %K::KIND, model_version_id = owner, "creating artifact");
        Ok(Prepared {
            record,
            owner,
            creating: true,
        })
    }

    async fn prepare_update<K: Mappable + Updatable>(
        &self,
        raw_id: &str,
        update: K,
        model_version_id: Option<&str>,
    ) -> RegistryResult<Prepared<K>> {
        let artifact_id = id::decode(raw_id)?;
        let requested_owner = id::decode_opt(model_version_id)?;

        let node = self.fetch_node(artifact_id).await?;
        let found = self.mapper.types().kind_of(&node);
        if found != Some(K::KIND) {
            return Err(RegistryError::InvalidArgument(format!(
                "artifact {} is not a {}",
                artifact_id,
                K::KIND
            )));
        }
        let existing: K = self.mapper.map_to_kind(&node)?;

        let owner = self.attached_model_version(artifact_id).await?;
        if let Some(requested) = requested_owner {
            if requested != owner {
                return Err(RegistryError::InvalidArgument(format!(
                    "artifact {} belongs to model version {}, cannot move it to {}",
                    artifact_id, owner, requested
                )));
            }
        }

        info!(kind = %K::KIND, artifact_id, model_version_id = owner, "updating artifact");
        Ok(Prepared {
            record: apply_update(&existing, update),
            owner,
            creating: false,
        })
    }

    // === Lookup ===

    /// Fetch one artifact of either kind
    pub async fn get_artifact_by_id(&self, artifact_id: &str) -> RegistryResult<Artifact> {
        let node = self.fetch_node(id::decode(artifact_id)?).await?;
        Ok(self.mapper.map_to_artifact(&node)?)
    }

    /// Fetch one artifact that must be of kind `K`
    pub async fn get_typed_by_id<K: Mappable>(&self, artifact_id: &str) -> RegistryResult<K> {
        let node = self.fetch_node(id::decode(artifact_id)?).await?;
        if self.mapper.types().kind_of(&node) != Some(K::KIND) {
            return Err(RegistryError::NotFound(format!(
                "no {} found for id {}",
                K::KIND,
                artifact_id
            )));
        }
        Ok(self.mapper.map_to_kind(&node)?)
    }

    /// Page through every artifact attributed to a model version
    pub async fn get_artifacts(
        &self,
        options: ListOptions,
        model_version_id: Option<&str>,
    ) -> RegistryResult<ArtifactList> {
        let raw = model_version_id.ok_or_else(|| {
            RegistryError::InvalidArgument("missing model version id, cannot list artifacts".into())
        })?;
        let owner = id::decode(raw)?;
        let store_options = store_list_options(&options)?;

        debug!(model_version_id = owner, ?store_options, "listing artifacts by context");
        let page = self.store.get_artifacts_by_context(owner, &store_options).await?;
        let items = page
            .artifacts
            .iter()
            .map(|node| self.mapper.map_to_artifact(node))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResponse::new(items, page.next_page_token, options.page_size))
    }

    /// Find the single `K` matching an external id, or a name within a model version
    pub async fn get_typed_by_params<K: Mappable>(
        &self,
        artifact_name: Option<&str>,
        model_version_id: Option<&str>,
        external_id: Option<&str>,
    ) -> RegistryResult<K> {
        let filter = match (artifact_name, model_version_id, external_id) {
            (None, None, Some(ext)) => FilterQuery::external_id(ext),
            (Some(display), Some(raw), None) => {
                FilterQuery::name(name::qualify(id::decode(raw)?, display))
            }
            _ => {
                return Err(RegistryError::InvalidArgument(format!(
                    "supply either an external id or both name and model version id \
                     (name={:?}, modelVersionId={:?}, externalId={:?})",
                    artifact_name, model_version_id, external_id
                )))
            }
        };

        let type_name = &self.mapper.types().artifact(K::KIND).name;
        let options = ListOperationOptions::new().with_filter(filter.to_string());
        debug!(type_name = %type_name, filter = %filter, "looking up artifact by params");

        let page = self.store.get_artifacts_by_type(type_name, &options).await?;
        match page.artifacts.as_slice() {
            [node] => Ok(self.mapper.map_to_kind(node)?),
            [] => Err(RegistryError::NotFound(format!(
                "no {} found for {}",
                K::KIND,
                filter
            ))),
            many => Err(RegistryError::NotFound(format!(
                "{} {}s found for {}, expected one",
                many.len(),
                K::KIND,
                filter
            ))),
        }
    }

    /// Page through artifacts of kind `K`, optionally within one model version
    pub async fn get_typed_list<K: Mappable>(
        &self,
        options: ListOptions,
        model_version_id: Option<&str>,
    ) -> RegistryResult<ListResponse<K>> {
        let type_name = self.mapper.types().artifact(K::KIND).name.clone();
        let store_options = store_list_options(&options)?;

        let page = match model_version_id {
            None => {
                debug!(type_name = %type_name, ?store_options, "listing artifacts by type");
                self.store
                    .get_artifacts_by_type(&type_name, &store_options)
                    .await?
            }
            Some(raw) => {
                let owner = id::decode(raw)?;
                let store_options =
                    store_options.with_filter(FilterQuery::type_name(type_name).to_string());
                debug!(model_version_id = owner, ?store_options, "listing artifacts by context");
                self.store
                    .get_artifacts_by_context(owner, &store_options)
                    .await?
            }
        };

        let items = page
            .artifacts
            .iter()
            .map(|node| self.mapper.map_to_kind(node))
            .collect::<Result<Vec<K>, _>>()?;

        Ok(ListResponse::new(items, page.next_page_token, options.page_size))
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    /// Fetch exactly one artifact node
    pub(super) async fn fetch_node(&self, artifact_id: i64) -> RegistryResult<StoreArtifact> {
        let mut nodes = self.store.get_artifacts_by_id(&[artifact_id]).await?;
        match nodes.len() {
            1 => Ok(nodes.remove(0)),
            0 => Err(RegistryError::NotFound(format!(
                "no artifact found for id {}",
                artifact_id
            ))),
            n => Err(RegistryError::NotFound(format!(
                "{} artifacts found for id {}, expected one",
                n, artifact_id
            ))),
        }
    }

    /// Check that a model version context with this id exists
    pub(super) async fn model_version_exists(&self, model_version_id: i64) -> RegistryResult<bool> {
        let contexts = self.store.get_contexts_by_id(&[model_version_id]).await?;
        Ok(contexts
            .iter()
            .any(|c| c.id == Some(model_version_id) && self.types().is_model_version(c)))
    }

    async fn ensure_model_version(&self, model_version_id: i64) -> RegistryResult<()> {
        if self.model_version_exists(model_version_id).await? {
            Ok(())
        } else {
            Err(RegistryError::NotFound(format!(
                "no model version found for id {}",
                model_version_id
            )))
        }
    }

    /// Model version an artifact is attributed to, if any
    pub(super) async fn find_model_version(&self, artifact_id: i64) -> RegistryResult<Option<i64>> {
        let contexts = self.store.get_contexts_by_artifact(artifact_id).await?;
        Ok(contexts
            .iter()
            .filter(|c| self.types().is_model_version(c))
            .find_map(|c| c.id))
    }

    async fn attached_model_version(&self, artifact_id: i64) -> RegistryResult<i64> {
        self.find_model_version(artifact_id).await?.ok_or_else(|| {
            RegistryError::NotFound(format!(
                "no model version attached to artifact {}",
                artifact_id
            ))
        })
    }
}

/// Translate caller pagination into store list options
fn store_list_options(options: &ListOptions) -> RegistryResult<ListOperationOptions> {
    let mut out = ListOperationOptions::new();
    if let Some(size) = options.page_size {
        if size <= 0 {
            return Err(RegistryError::InvalidArgument(format!(
                "invalid page size {}, must be positive",
                size
            )));
        }
        out = out.with_max_result_size(size);
    }
    out.order_by = options.order_by.map(|o| match o {
        OrderBy::CreateTime => OrderField::CreateTime,
        OrderBy::LastUpdateTime => OrderField::LastUpdateTime,
        OrderBy::Id => OrderField::Id,
    });
    out.is_asc = options.sort_order.map(|s| s == SortOrder::Asc);
    if let Some(token) = options.next_page_token.as_deref().filter(|t| !t.is_empty()) {
        out = out.with_page_token(token);
    }
    Ok(out)
}

/// A single-record write must report exactly one id
fn single_id(ids: Vec<i64>, call: &str) -> Result<i64, StoreError> {
    match ids.as_slice() {
        [id] => Ok(*id),
        other => Err(StoreError::Internal(format!(
            "{} returned {} ids for one record",
            call,
            other.len()
        ))),
    }
}
