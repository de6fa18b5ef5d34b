//! Metadata validation errors.

use thiserror::Error;

/// Result type for metadata construction.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// An invariant of the entity metadata model was violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("entity name must not be empty")]
    EmptyEntityName,

    #[error("entity '{entity}': property name must not be empty")]
    EmptyPropertyName { entity: String },

    #[error("entity '{entity}': duplicate property '{property}'")]
    DuplicateProperty { entity: String, property: String },

    #[error("entity '{entity}': index '{index}' lists no properties")]
    EmptyIndex { entity: String, index: String },

    #[error("entity '{entity}': index '{index}' references unknown property '{property}'")]
    UnknownIndexProperty {
        entity: String,
        index: String,
        property: String,
    },

    #[error("entity '{entity}': relationship '{relationship}' has no key properties")]
    EmptyRelationshipKeys {
        entity: String,
        relationship: String,
    },

    #[error(
        "entity '{entity}': relationship '{relationship}' has {foreign} foreign key(s) but {principal} principal key(s)"
    )]
    RelationshipArity {
        entity: String,
        relationship: String,
        foreign: usize,
        principal: usize,
    },

    #[error("entity '{entity}': relationship '{relationship}' has no related entity")]
    MissingRelatedEntity {
        entity: String,
        relationship: String,
    },
}
