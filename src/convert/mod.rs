//! Translation between REST resources and store records
//!
//! Everything here is pure: identifier codec, name qualification, the per-kind
//! property tables, and the mapper built on top of them.

pub mod id;
mod mapper;
pub mod name;
mod schema;
mod update;

pub use mapper::{ArtifactMapper, CommonFields, Mappable, RegisteredTypes, TypeRef};
pub use schema::{artifact_type_def, model_version_type_def, KindSchema, PropertySpec};
pub use update::{apply_update, Updatable};

use crate::model::ArtifactKindTag;
use crate::store::PropertyType;
use thiserror::Error;

/// Failure translating between representations
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Invalid id: '{0}'")]
    InvalidId(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unknown artifact type: id={type_id:?} name={type_name:?}")]
    UnknownType {
        type_id: Option<i64>,
        type_name: Option<String>,
    },

    #[error("Expected {expected} but record is {found}")]
    KindMismatch {
        expected: ArtifactKindTag,
        found: ArtifactKindTag,
    },

    #[error("Property '{key}' is not declared for {kind}")]
    UnexpectedProperty { kind: ArtifactKindTag, key: String },

    #[error("Property '{key}' has type {found:?}, expected {expected:?}")]
    PropertyType {
        key: String,
        expected: PropertyType,
        found: PropertyType,
    },

    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: String, value: String },
}
