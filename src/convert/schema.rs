//! Per-kind property tables
//!
//! Each artifact kind declares the typed store properties it owns, together
//! with accessors into the REST record. The same table registers the store
//! type and drives translation in both directions, so a property the table
//! does not list fails translation instead of being dropped.

use crate::model::{ArtifactKind, DocArtifact, ModelArtifact};
use crate::store::{PropertyType, TypeDef};

/// One typed store property and how it maps onto a record of kind `T`
pub struct PropertySpec<T> {
    pub key: &'static str,
    pub ty: PropertyType,
    pub get: fn(&T) -> Option<String>,
    pub set: fn(&mut T, String),
}

impl<T> PropertySpec<T> {
    const fn string(key: &'static str, get: fn(&T) -> Option<String>, set: fn(&mut T, String)) -> Self {
        Self {
            key,
            ty: PropertyType::String,
            get,
            set,
        }
    }
}

/// Kinds that carry a property table
pub trait KindSchema: ArtifactKind + Sized {
    fn properties() -> &'static [PropertySpec<Self>];

    fn property(key: &str) -> Option<&'static PropertySpec<Self>> {
        Self::properties().iter().find(|p| p.key == key)
    }
}

type ModelSpec = PropertySpec<ModelArtifact>;
type DocSpec = PropertySpec<DocArtifact>;

const MODEL_ARTIFACT_PROPERTIES: &[ModelSpec] = &[
    ModelSpec::string("description", |a| a.description.clone(), |a, v| a.description = Some(v)),
    ModelSpec::string(
        "model_format_name",
        |a| a.model_format_name.clone(),
        |a, v| a.model_format_name = Some(v),
    ),
    ModelSpec::string(
        "model_format_version",
        |a| a.model_format_version.clone(),
        |a, v| a.model_format_version = Some(v),
    ),
    ModelSpec::string("storage_key", |a| a.storage_key.clone(), |a, v| a.storage_key = Some(v)),
    ModelSpec::string("storage_path", |a| a.storage_path.clone(), |a, v| a.storage_path = Some(v)),
    ModelSpec::string(
        "service_account_name",
        |a| a.service_account_name.clone(),
        |a, v| a.service_account_name = Some(v),
    ),
];

const DOC_ARTIFACT_PROPERTIES: &[DocSpec] = &[DocSpec::string(
    "description",
    |a| a.description.clone(),
    |a, v| a.description = Some(v),
)];

impl KindSchema for ModelArtifact {
    fn properties() -> &'static [PropertySpec<Self>] {
        MODEL_ARTIFACT_PROPERTIES
    }
}

impl KindSchema for DocArtifact {
    fn properties() -> &'static [PropertySpec<Self>] {
        DOC_ARTIFACT_PROPERTIES
    }
}

/// Store type definition for an artifact kind
pub fn artifact_type_def<K: KindSchema>(type_name: &str) -> TypeDef {
    K::properties()
        .iter()
        .fold(TypeDef::new(type_name), |def, p| def.with_property(p.key, p.ty))
}

/// Store type definition for model versions
pub fn model_version_type_def(type_name: &str) -> TypeDef {
    TypeDef::new(type_name)
        .with_property("description", PropertyType::String)
        .with_property("model_name", PropertyType::String)
        .with_property("version", PropertyType::String)
        .with_property("author", PropertyType::String)
}
