//! REST-facing resource types
//!
//! These are the shapes an HTTP layer serializes. Field names follow the
//! registry's camelCase wire format.

mod artifact;
mod list;
mod metadata;

pub use artifact::{Artifact, ArtifactKind, ArtifactKindTag, DocArtifact, ModelArtifact};
pub use list::{ArtifactList, ListOptions, ListResponse, OrderBy, SortOrder};
pub use metadata::{ArtifactState, CustomProperties, MetadataValue};
