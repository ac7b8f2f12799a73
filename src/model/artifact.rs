//! REST-facing artifact records and the artifact union

use super::metadata::{ArtifactState, CustomProperties};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminates the concrete artifact kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKindTag {
    Model,
    Doc,
}

impl ArtifactKindTag {
    /// Value of the `artifactType` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model-artifact",
            Self::Doc => "doc-artifact",
        }
    }
}

impl fmt::Display for ArtifactKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model binary (weights, serialized pipeline, ...) attached to a model version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelArtifact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name, unique within the owning model version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ArtifactState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<CustomProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_format_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_format_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
}

impl ModelArtifact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

/// A document (model card, report, ...) attached to a model version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocArtifact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ArtifactState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<CustomProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<String>,
}

impl DocArtifact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

/// Exactly one concrete artifact kind, tagged by `artifactType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "artifactType")]
pub enum Artifact {
    #[serde(rename = "model-artifact")]
    Model(ModelArtifact),
    #[serde(rename = "doc-artifact")]
    Doc(DocArtifact),
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKindTag {
        match self {
            Self::Model(_) => ArtifactKindTag::Model,
            Self::Doc(_) => ArtifactKindTag::Doc,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Model(a) => a.id.as_deref(),
            Self::Doc(a) => a.id.as_deref(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Model(a) => a.name.as_deref(),
            Self::Doc(a) => a.name.as_deref(),
        }
    }
}

impl From<ModelArtifact> for Artifact {
    fn from(a: ModelArtifact) -> Self {
        Self::Model(a)
    }
}

impl From<DocArtifact> for Artifact {
    fn from(a: DocArtifact) -> Self {
        Self::Doc(a)
    }
}

/// A concrete member of the [`Artifact`] union
pub trait ArtifactKind: Clone + Send + Sync + Into<Artifact> + 'static {
    const KIND: ArtifactKindTag;

    fn id(&self) -> Option<&str>;
}

impl ArtifactKind for ModelArtifact {
    const KIND: ArtifactKindTag = ArtifactKindTag::Model;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl ArtifactKind for DocArtifact {
    const KIND: ArtifactKindTag = ArtifactKindTag::Doc;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}
