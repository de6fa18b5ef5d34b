//! Data providers.
//!
//! A [`DataProvider`] is the boundary between dynapi and whatever knows the
//! shape of the data: a JSON document on disk, a schema worker talking to a
//! live database, or a fixed list assembled in code. The loader calls
//! [`DataProvider::load_entities`] once per load and replaces the repository
//! with the result.

mod file;
mod static_provider;
mod worker;

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::loader::Cancellation;
use crate::metadata::{EntityConfiguration, MetadataError};
use crate::worker::WorkerError;

pub use file::JsonFileProvider;
pub use static_provider::StaticProvider;
pub use worker::{entity_from_table, WorkerProvider};

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors a provider can report while loading.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The backing source could not be reached.
    #[error("provider '{provider}' is unreachable: {message}")]
    Unreachable { provider: String, message: String },

    /// The source answered with data that could not be understood.
    #[error("provider '{provider}' returned malformed metadata: {message}")]
    Malformed { provider: String, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// The metadata parsed but violates an entity invariant.
    #[error("invalid entity metadata: {0}")]
    Invalid(#[from] MetadataError),

    #[error("load cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Fail with [`ProviderError::Cancelled`] if cancellation was requested.
    pub fn check(cancel: &Cancellation) -> ProviderResult<()> {
        if cancel.is_cancelled() {
            Err(ProviderError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Source of entity metadata.
///
/// Implementations should check `cancel` between units of work; the loader
/// also races the whole call against it.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Return all entities, in the order generators should emit them.
    async fn load_entities(&self, cancel: &Cancellation) -> ProviderResult<Vec<EntityConfiguration>>;
}
