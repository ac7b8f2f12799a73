//! Typed custom-property values and artifact state

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A custom property value, tagged by `metadataType`
///
/// Integers travel as strings so 64-bit values survive JSON clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "metadataType")]
pub enum MetadataValue {
    #[serde(rename = "MetadataIntValue")]
    Int { int_value: String },
    #[serde(rename = "MetadataDoubleValue")]
    Double { double_value: f64 },
    #[serde(rename = "MetadataStringValue")]
    String { string_value: String },
    #[serde(rename = "MetadataBoolValue")]
    Bool { bool_value: bool },
    /// Encoded struct payload, passed through untouched
    #[serde(rename = "MetadataStructValue")]
    Struct { struct_value: String },
}

impl MetadataValue {
    pub fn int(value: i64) -> Self {
        Self::Int {
            int_value: value.to_string(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String {
            string_value: value.into(),
        }
    }

    pub fn bool(value: bool) -> Self {
        Self::Bool { bool_value: value }
    }

    pub fn double(value: f64) -> Self {
        Self::Double {
            double_value: value,
        }
    }
}

/// Custom properties collection
pub type CustomProperties = HashMap<String, MetadataValue>;

/// Lifecycle state of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactState {
    Unknown,
    Pending,
    Live,
    MarkedForDeletion,
    Deleted,
    Abandoned,
    Reference,
}
