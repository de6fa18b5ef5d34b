//! JSON metadata document.
//!
//! The interchange format shared by the file provider and the CLI:
//!
//! ```json
//! { "entities": [ { "name": "User", "properties": [ { "name": "Id", "type": "bigint", "primary_key": true } ] } ] }
//! ```

use serde::{Deserialize, Serialize};

use super::entity::EntityConfiguration;

/// A set of entities in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDocument {
    #[serde(default)]
    pub entities: Vec<EntityConfiguration>,
}

impl EntityDocument {
    /// Parse a document, validating every entity.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<Vec<EntityConfiguration>> for EntityDocument {
    fn from(entities: Vec<EntityConfiguration>) -> Self {
        Self { entities }
    }
}
