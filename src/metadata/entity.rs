//! Entity metadata value objects.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{MetadataError, MetadataResult};
use super::types::DataType;

/// One property (column/field) of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyConfiguration {
    /// Property name, unique within the owning entity.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub data_type: DataType,
    /// Whether NULL values are allowed.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Part of a foreign key.
    #[serde(default)]
    pub foreign_key: bool,
    /// Value is generated by the store (identity, computed).
    #[serde(default)]
    pub generated: bool,
    /// Maximum length for string types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

fn default_nullable() -> bool {
    true
}

impl PropertyConfiguration {
    /// Create a nullable, non-key property.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
            foreign_key: false,
            generated: false,
            max_length: None,
        }
    }

    /// Mark as (part of) the primary key. Key columns are never nullable.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Mark as (part of) a foreign key.
    pub fn foreign_key(mut self) -> Self {
        self.foreign_key = true;
        self
    }

    /// Mark as not nullable.
    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark as store-generated.
    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    /// Set the maximum length.
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

/// An index over one or more properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfiguration {
    pub name: String,
    /// Indexed property names, in key order.
    pub properties: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub clustered: bool,
}

impl IndexConfiguration {
    pub fn new<I, S>(name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            properties: properties.into_iter().map(Into::into).collect(),
            unique: false,
            clustered: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn clustered(mut self) -> Self {
        self.clustered = true;
        self
    }
}

/// Cardinality of a relationship, seen from the owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationshipKind {
    /// Whether the owning side sees a collection of related entities.
    pub fn is_collection(self) -> bool {
        matches!(self, RelationshipKind::OneToMany | RelationshipKind::ManyToMany)
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationshipKind::OneToOne => "one-to-one",
            RelationshipKind::OneToMany => "one-to-many",
            RelationshipKind::ManyToOne => "many-to-one",
            RelationshipKind::ManyToMany => "many-to-many",
        };
        f.write_str(s)
    }
}

/// A navigable relationship from the owning entity to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipConfiguration {
    pub name: String,
    /// Name of the entity on the other side.
    pub related_entity: String,
    pub kind: RelationshipKind,
    /// Foreign-key property names (on the dependent side), in key order.
    pub foreign_keys: Vec<String>,
    /// Principal-key property names (on the principal side), in key order.
    pub principal_keys: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

impl RelationshipConfiguration {
    pub fn new(
        name: impl Into<String>,
        related_entity: impl Into<String>,
        kind: RelationshipKind,
    ) -> Self {
        Self {
            name: name.into(),
            related_entity: related_entity.into(),
            kind,
            foreign_keys: Vec::new(),
            principal_keys: Vec::new(),
            required: false,
        }
    }

    /// Add one foreign-key/principal-key column pair.
    pub fn key(mut self, foreign: impl Into<String>, principal: impl Into<String>) -> Self {
        self.foreign_keys.push(foreign.into());
        self.principal_keys.push(principal.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Immutable description of one entity.
///
/// Instances only exist in a validated state: they are produced by
/// [`EntityBuilder::build`] or by deserialisation, which runs the same checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEntity")]
pub struct EntityConfiguration {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    properties: Vec<PropertyConfiguration>,
    indexes: Vec<IndexConfiguration>,
    relationships: Vec<RelationshipConfiguration>,
}

impl EntityConfiguration {
    /// Start building an entity.
    pub fn builder(name: impl Into<String>) -> EntityBuilder {
        EntityBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// `schema.name`, or just `name` when unqualified.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// Properties in declared order.
    pub fn properties(&self) -> &[PropertyConfiguration] {
        &self.properties
    }

    pub fn indexes(&self) -> &[IndexConfiguration] {
        &self.indexes
    }

    pub fn relationships(&self) -> &[RelationshipConfiguration] {
        &self.relationships
    }

    pub fn property(&self, name: &str) -> Option<&PropertyConfiguration> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Primary-key properties in declared order.
    pub fn primary_key(&self) -> impl Iterator<Item = &PropertyConfiguration> {
        self.properties.iter().filter(|p| p.primary_key)
    }

    /// The primary-key property when the key is exactly one column.
    pub fn single_key(&self) -> Option<&PropertyConfiguration> {
        let mut keys = self.primary_key();
        match (keys.next(), keys.next()) {
            (Some(key), None) => Some(key),
            _ => None,
        }
    }

    fn validate(self) -> MetadataResult<Self> {
        if self.name.trim().is_empty() {
            return Err(MetadataError::EmptyEntityName);
        }

        let mut seen = HashSet::new();
        for property in &self.properties {
            if property.name.trim().is_empty() {
                return Err(MetadataError::EmptyPropertyName {
                    entity: self.name.clone(),
                });
            }
            if !seen.insert(property.name.as_str()) {
                return Err(MetadataError::DuplicateProperty {
                    entity: self.name.clone(),
                    property: property.name.clone(),
                });
            }
        }

        for index in &self.indexes {
            if index.properties.is_empty() {
                return Err(MetadataError::EmptyIndex {
                    entity: self.name.clone(),
                    index: index.name.clone(),
                });
            }
            if let Some(missing) = index.properties.iter().find(|p| !seen.contains(p.as_str())) {
                return Err(MetadataError::UnknownIndexProperty {
                    entity: self.name.clone(),
                    index: index.name.clone(),
                    property: missing.clone(),
                });
            }
        }

        for relationship in &self.relationships {
            if relationship.related_entity.trim().is_empty() {
                return Err(MetadataError::MissingRelatedEntity {
                    entity: self.name.clone(),
                    relationship: relationship.name.clone(),
                });
            }
            if relationship.foreign_keys.is_empty() || relationship.principal_keys.is_empty() {
                return Err(MetadataError::EmptyRelationshipKeys {
                    entity: self.name.clone(),
                    relationship: relationship.name.clone(),
                });
            }
            if relationship.foreign_keys.len() != relationship.principal_keys.len() {
                return Err(MetadataError::RelationshipArity {
                    entity: self.name.clone(),
                    relationship: relationship.name.clone(),
                    foreign: relationship.foreign_keys.len(),
                    principal: relationship.principal_keys.len(),
                });
            }
        }

        Ok(self)
    }
}

/// Unvalidated wire form of an entity.
#[derive(Debug, Deserialize)]
struct RawEntity {
    name: String,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default)]
    properties: Vec<PropertyConfiguration>,
    #[serde(default)]
    indexes: Vec<IndexConfiguration>,
    #[serde(default)]
    relationships: Vec<RelationshipConfiguration>,
}

impl TryFrom<RawEntity> for EntityConfiguration {
    type Error = MetadataError;

    fn try_from(raw: RawEntity) -> MetadataResult<Self> {
        EntityConfiguration {
            name: raw.name,
            schema: raw.schema,
            properties: raw.properties,
            indexes: raw.indexes,
            relationships: raw.relationships,
        }
        .validate()
    }
}

/// Builder for [`EntityConfiguration`].
#[derive(Debug, Clone)]
pub struct EntityBuilder {
    inner: EntityConfiguration,
}

impl EntityBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: EntityConfiguration {
                name: name.into(),
                schema: None,
                properties: Vec::new(),
                indexes: Vec::new(),
                relationships: Vec::new(),
            },
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.inner.schema = Some(schema.into());
        self
    }

    pub fn property(mut self, property: PropertyConfiguration) -> Self {
        self.inner.properties.push(property);
        self
    }

    pub fn properties(mut self, properties: impl IntoIterator<Item = PropertyConfiguration>) -> Self {
        self.inner.properties.extend(properties);
        self
    }

    pub fn index(mut self, index: IndexConfiguration) -> Self {
        self.inner.indexes.push(index);
        self
    }

    pub fn relationship(mut self, relationship: RelationshipConfiguration) -> Self {
        self.inner.relationships.push(relationship);
        self
    }

    /// Validate and produce the entity.
    pub fn build(self) -> MetadataResult<EntityConfiguration> {
        self.inner.validate()
    }
}
