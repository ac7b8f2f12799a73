//! Metadata store contract and backends
//!
//! The registry consumes the store only through the `MetadataStore` trait.
//! `MemoryStore` is the in-process implementation used by tests and the CLI.

pub mod filter;
mod memory;
mod traits;
mod types;

pub use filter::{FilterField, FilterQuery};
pub use memory::{MemoryStore, DEFAULT_PAGE_SIZE};
pub use traits::{MetadataStore, StoreError, StoreResult};
pub use types::{
    ArtifactPage, Attribution, ListOperationOptions, OrderField, Properties, PropertyType,
    StoreArtifact, StoreContext, StoreState, StoreValue, TypeDef,
};
