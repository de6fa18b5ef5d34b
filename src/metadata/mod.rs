//! Entity metadata model.
//!
//! Entities are described by data rather than by compiled types: a name, an
//! optional schema qualifier, ordered properties, indexes and relationships.
//! Every [`EntityConfiguration`] is validated on construction and immutable
//! afterwards, so downstream components (repository, generators, bridge) can
//! rely on its invariants without re-checking them.
//!
//! # Example
//!
//! ```ignore
//! use dynapi::metadata::{DataType, EntityConfiguration, PropertyConfiguration};
//!
//! let user = EntityConfiguration::builder("User")
//!     .property(PropertyConfiguration::new("Id", DataType::Int64).primary_key())
//!     .property(PropertyConfiguration::new("Name", DataType::String))
//!     .build()?;
//! ```

mod document;
mod entity;
mod error;
mod types;

pub use document::EntityDocument;
pub use entity::{
    EntityBuilder, EntityConfiguration, IndexConfiguration, PropertyConfiguration,
    RelationshipConfiguration, RelationshipKind,
};
pub use error::{MetadataError, MetadataResult};
pub use types::DataType;
