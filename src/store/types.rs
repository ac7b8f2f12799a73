//! Store-side records: untyped artifact nodes, contexts and attribution edges

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Typed property value as held by the metadata store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreValue {
    IntValue(i64),
    DoubleValue(f64),
    StringValue(String),
    BoolValue(bool),
    /// Encoded struct payload, opaque to the store
    StructValue(String),
}

impl StoreValue {
    /// The declared type this value satisfies
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::IntValue(_) => PropertyType::Int,
            Self::DoubleValue(_) => PropertyType::Double,
            Self::StringValue(_) => PropertyType::String,
            Self::BoolValue(_) => PropertyType::Bool,
            Self::StructValue(_) => PropertyType::Struct,
        }
    }
}

/// Properties collection
pub type Properties = HashMap<String, StoreValue>;

/// Declared type of a property in a store type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    Int,
    Double,
    String,
    Bool,
    Struct,
}

/// A named artifact or context type with its declared properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub properties: HashMap<String, PropertyType>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, ty: PropertyType) -> Self {
        self.properties.insert(key.into(), ty);
        self
    }
}

/// Artifact lifecycle state as tracked by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreState {
    Unknown,
    Pending,
    Live,
    MarkedForDeletion,
    Deleted,
    Abandoned,
    Reference,
}

/// An artifact node: kind is carried by `type_id` / `type_name`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreArtifact {
    pub id: Option<i64>,
    pub type_id: Option<i64>,
    /// Filled in by the store on reads
    pub type_name: Option<String>,
    pub name: Option<String>,
    pub uri: Option<String>,
    pub external_id: Option<String>,
    pub state: Option<StoreState>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub custom_properties: Properties,
    pub create_time_since_epoch: Option<i64>,
    pub last_update_time_since_epoch: Option<i64>,
}

/// A grouping context (e.g. a model version)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreContext {
    pub id: Option<i64>,
    pub type_id: Option<i64>,
    pub type_name: Option<String>,
    pub name: Option<String>,
    pub external_id: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub custom_properties: Properties,
    pub create_time_since_epoch: Option<i64>,
    pub last_update_time_since_epoch: Option<i64>,
}

/// Ownership edge from a context to an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribution {
    pub context_id: i64,
    pub artifact_id: i64,
}

/// Field a listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderField {
    CreateTime,
    LastUpdateTime,
    #[default]
    Id,
}

/// Paging, ordering and filtering for list calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOperationOptions {
    /// Maximum number of results; the store picks a default when absent
    pub max_result_size: Option<i32>,
    pub order_by: Option<OrderField>,
    /// Defaults to ascending
    pub is_asc: Option<bool>,
    pub next_page_token: Option<String>,
    pub filter_query: Option<String>,
}

impl ListOperationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_result_size(mut self, size: i32) -> Self {
        self.max_result_size = Some(size);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_query = Some(filter.into());
        self
    }

    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.next_page_token = Some(token.into());
        self
    }
}

/// One page of artifacts
#[derive(Debug, Clone, Default)]
pub struct ArtifactPage {
    pub artifacts: Vec<StoreArtifact>,
    /// Absent when there are no further pages
    pub next_page_token: Option<String>,
}
