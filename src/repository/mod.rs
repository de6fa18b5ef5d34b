//! Entity repository.
//!
//! The repository owns the current [`Snapshot`] and republishes it atomically.
//!
//! ```text
//! ┌──────────────┐  replace()/commit()   ┌────────────────────────────┐
//! │ EntityLoader │ ─────────────────────▶│ EntityRepository           │
//! └──────────────┘                       │  current: ArcSwap<Snapshot>│
//!                                        └────────────┬───────────────┘
//!                                                     │ snapshot() / get() / list()
//!                        ┌────────────────────────────┼─────────────────────┐
//!                        ▼                            ▼                     ▼
//!                 ProtoGenerator              SchemaComposer         ProtocolBridge
//! ```
//!
//! Readers never block: they load the current `Arc<Snapshot>` and keep it for
//! as long as their operation runs. A reload builds a complete new snapshot
//! off to the side and swaps the pointer, so a reader sees either the old
//! entity set or the new one, never a mix.

mod fingerprint;
mod snapshot;

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use thiserror::Error;

use crate::metadata::EntityConfiguration;

pub use fingerprint::compute_hash;
pub use snapshot::{Snapshot, SnapshotBuilder};

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors raised while publishing a snapshot.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Two entities in one load share a name.
    #[error("duplicate entity name in snapshot: {0}")]
    DuplicateEntity(String),

    /// The snapshot could not be serialised for fingerprinting.
    #[error("failed to fingerprint snapshot: {0}")]
    Fingerprint(#[source] serde_json::Error),
}

/// Process-wide registry of entity metadata.
///
/// Constructed once by the composition root and shared by `Arc`.
pub struct EntityRepository {
    current: ArcSwap<Snapshot>,
    /// Serialises writers so generations are strictly increasing.
    writer: Mutex<()>,
}

impl EntityRepository {
    /// Create an empty repository (generation 0).
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty()),
            writer: Mutex::new(()),
        }
    }

    /// Pin the current snapshot.
    ///
    /// The returned snapshot stays valid (and unchanged) even if a reload
    /// completes while the caller is still using it.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Look up an entity in the current snapshot.
    pub fn get(&self, name: &str) -> Option<Arc<EntityConfiguration>> {
        self.current.load().get(name).cloned()
    }

    /// All entities of the current snapshot, in load order.
    pub fn list(&self) -> Vec<Arc<EntityConfiguration>> {
        self.current.load().entities().to_vec()
    }

    /// Generation of the current snapshot.
    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    /// Start staging a new snapshot.
    pub fn stage(&self) -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// Replace the whole entity set.
    ///
    /// Entities absent from `entities` are dropped. On error the current
    /// snapshot stays installed.
    pub fn replace<I>(&self, entities: I) -> RepositoryResult<Arc<Snapshot>>
    where
        I: IntoIterator<Item = EntityConfiguration>,
    {
        let mut builder = SnapshotBuilder::new();
        for entity in entities {
            builder.insert(entity)?;
        }
        self.commit(builder)
    }

    /// Publish a staged snapshot.
    pub fn commit(&self, builder: SnapshotBuilder) -> RepositoryResult<Arc<Snapshot>> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let generation = self.current.load().generation() + 1;
        let snapshot = Arc::new(Snapshot::from_builder(builder, generation)?);
        self.current.store(Arc::clone(&snapshot));

        Ok(snapshot)
    }
}

impl Default for EntityRepository {
    fn default() -> Self {
        Self::new()
    }
}
