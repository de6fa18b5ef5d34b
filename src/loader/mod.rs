//! Entity loading.
//!
//! [`EntityLoader`] pulls the full entity set from a [`DataProvider`] and
//! replaces the repository snapshot with it. A failed or cancelled load leaves
//! the previously installed snapshot in place (the empty snapshot on first
//! run); there is no retry.

mod cancel;

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LoaderSettings;
use crate::provider::{DataProvider, ProviderError};
use crate::repository::{EntityRepository, RepositoryError, Snapshot};

pub use cancel::{cancellation, CancelHandle, Cancellation};

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to load entities: {0}")]
    Provider(#[source] ProviderError),

    #[error("failed to publish entities: {0}")]
    Repository(#[from] RepositoryError),

    #[error("entity load cancelled")]
    Cancelled,
}

impl From<ProviderError> for LoadError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Cancelled => LoadError::Cancelled,
            other => LoadError::Provider(other),
        }
    }
}

/// Outcome of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub provider: String,
    pub entities: usize,
    pub generation: u64,
    pub fingerprint: String,
    pub elapsed: Duration,
}

/// Drives provider → repository loads.
pub struct EntityLoader {
    provider: Arc<dyn DataProvider>,
    repository: Arc<EntityRepository>,
    settings: LoaderSettings,
}

impl EntityLoader {
    pub fn new(
        provider: Arc<dyn DataProvider>,
        repository: Arc<EntityRepository>,
        settings: LoaderSettings,
    ) -> Self {
        Self {
            provider,
            repository,
            settings,
        }
    }

    pub fn repository(&self) -> &Arc<EntityRepository> {
        &self.repository
    }

    /// Startup load. Returns `Ok(None)` when loading is disabled.
    pub async fn start(&self, cancel: &Cancellation) -> LoadResult<Option<LoadReport>> {
        if !self.settings.enabled {
            info!("entity loading disabled; repository stays empty");
            return Ok(None);
        }
        self.load(cancel).await.map(Some)
    }

    /// Load again, replacing whatever is installed.
    pub async fn reload(&self, cancel: &Cancellation) -> LoadResult<LoadReport> {
        self.load(cancel).await
    }

    /// Fetch every entity from the provider and publish them as one snapshot.
    pub async fn load(&self, cancel: &Cancellation) -> LoadResult<LoadReport> {
        let provider = self.provider.name();
        info!(provider, "loading entity metadata");
        let started = Instant::now();

        let result = self.fetch_and_publish(cancel).await;
        let elapsed = started.elapsed();

        match result {
            Ok((entities, snapshot)) => {
                let report = LoadReport {
                    provider: provider.to_string(),
                    entities,
                    generation: snapshot.generation(),
                    fingerprint: snapshot.fingerprint().to_string(),
                    elapsed,
                };
                info!(
                    provider,
                    entities = report.entities,
                    generation = report.generation,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "entity metadata loaded"
                );
                Ok(report)
            }
            Err(error) => {
                warn!(provider, error = %error, "entity load failed; keeping previous snapshot");
                Err(error)
            }
        }
    }

    async fn fetch_and_publish(
        &self,
        cancel: &Cancellation,
    ) -> LoadResult<(usize, Arc<Snapshot>)> {
        let entities = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LoadError::Cancelled),
            result = self.provider.load_entities(cancel) => result?,
        };

        for entity in &entities {
            debug!(
                entity = entity.name(),
                properties = entity.properties().len(),
                relationships = entity.relationships().len(),
                "loaded entity"
            );
        }

        if cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        let count = entities.len();
        let snapshot = self.repository.replace(entities)?;
        Ok((count, snapshot))
    }
}
