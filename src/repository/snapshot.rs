//! Immutable snapshots of the entity set.

use std::collections::HashMap;
use std::sync::Arc;

use super::fingerprint::compute_hash;
use super::{RepositoryError, RepositoryResult};
use crate::metadata::EntityConfiguration;
use crate::naming::singularize;

/// One complete, internally consistent copy of all entity metadata.
///
/// Entities keep the order in which they were loaded; that order drives the
/// output order of every generator.
#[derive(Debug)]
pub struct Snapshot {
    generation: u64,
    entities: Vec<Arc<EntityConfiguration>>,
    by_name: HashMap<String, usize>,
    fingerprint: String,
}

impl Snapshot {
    /// The empty snapshot a repository starts with.
    pub(crate) fn empty() -> Self {
        Self {
            generation: 0,
            entities: Vec::new(),
            by_name: HashMap::new(),
            // sha256 of "[]"
            fingerprint: "4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945"
                .to_string(),
        }
    }

    pub(crate) fn from_builder(builder: SnapshotBuilder, generation: u64) -> RepositoryResult<Self> {
        let fingerprint =
            compute_hash(&builder.entities).map_err(RepositoryError::Fingerprint)?;
        Ok(Self {
            generation,
            entities: builder.entities.into_iter().map(Arc::new).collect(),
            by_name: builder.by_name,
            fingerprint,
        })
    }

    /// Monotonic number of the load that produced this snapshot (0 = never loaded).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// SHA-256 over the canonical JSON form of the entities.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Look up an entity by exact name.
    pub fn get(&self, name: &str) -> Option<&Arc<EntityConfiguration>> {
        self.by_name.get(name).map(|&i| &self.entities[i])
    }

    /// Entities in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntityConfiguration>> {
        self.entities.iter()
    }

    pub fn entities(&self) -> &[Arc<EntityConfiguration>] {
        &self.entities
    }

    /// Look up an entity ignoring ASCII case.
    pub fn find_ignore_case(&self, name: &str) -> Option<&Arc<EntityConfiguration>> {
        self.get(name).or_else(|| {
            self.entities
                .iter()
                .find(|e| e.name().eq_ignore_ascii_case(name))
        })
    }

    /// Resolve a resource segment such as `users` or `order-lines` to an entity.
    ///
    /// Tries, in order: exact name, case-insensitive name, the name with
    /// separators removed, and finally the singular form of the segment.
    pub fn resolve_resource(&self, resource: &str) -> Option<&Arc<EntityConfiguration>> {
        if let Some(entity) = self.find_ignore_case(resource) {
            return Some(entity);
        }

        let wanted = normalize(resource);
        if let Some(entity) = self.entities.iter().find(|e| normalize(e.name()) == wanted) {
            return Some(entity);
        }

        let singular = normalize(&singularize(resource));
        self.entities
            .iter()
            .find(|e| normalize(e.name()) == singular)
    }
}

/// Lower-case with separators stripped, so `order_lines`, `order-lines` and
/// `OrderLines` compare equal.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Staging area for the next snapshot.
///
/// Entities are accumulated with [`add_or_update`](Self::add_or_update); none
/// of them are visible to readers until the builder is committed through
/// [`EntityRepository::commit`](super::EntityRepository::commit).
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    entities: Vec<EntityConfiguration>,
    by_name: HashMap<String, usize>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, replacing (in place) any staged entity with the same name.
    ///
    /// Returns `true` when an existing entry was replaced.
    pub fn add_or_update(&mut self, entity: EntityConfiguration) -> bool {
        match self.by_name.get(entity.name()) {
            Some(&i) => {
                self.entities[i] = entity;
                true
            }
            None => {
                self.by_name
                    .insert(entity.name().to_string(), self.entities.len());
                self.entities.push(entity);
                false
            }
        }
    }

    /// Add an entity, failing if the name is already staged.
    pub fn insert(&mut self, entity: EntityConfiguration) -> RepositoryResult<()> {
        if self.by_name.contains_key(entity.name()) {
            return Err(RepositoryError::DuplicateEntity(entity.name().to_string()));
        }
        self.add_or_update(entity);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
