//! Composition root.
//!
//! [`ApiRuntime`] wires the repository, loader, generators, bridge and raw
//! query gate together from [`Settings`]. Nothing is global: callers own the
//! runtime and pass it (or pieces of it) to whatever hosts the endpoints.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::bridge::{BridgeConfig, ProtocolBridge};
use crate::codegen::{ProtoGenerator, ProtoOptions, SchemaComposer};
use crate::config::{ProviderKind, Settings, SettingsError};
use crate::loader::{Cancellation, EntityLoader, LoadError, LoadReport};
use crate::provider::{DataProvider, JsonFileProvider, ProviderError, WorkerProvider};
use crate::rawquery::RawQueryGate;
use crate::repository::{EntityRepository, Snapshot};

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("configuration error: {0}")]
    Settings(#[from] SettingsError),

    #[error("provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

pub struct ApiRuntime {
    settings: Settings,
    repository: Arc<EntityRepository>,
    loader: EntityLoader,
    proto: ProtoGenerator,
    composer: SchemaComposer,
    bridge: ProtocolBridge,
    gate: RawQueryGate,
}

impl ApiRuntime {
    /// Build a runtime around an explicit provider.
    pub fn new(settings: Settings, provider: Arc<dyn DataProvider>) -> Self {
        let repository = Arc::new(EntityRepository::new());
        let loader = EntityLoader::new(provider, repository.clone(), settings.loader.clone());
        let proto = ProtoGenerator::new(ProtoOptions::from(&settings.generator));
        let composer = SchemaComposer::with_crud().include_comments(settings.generator.include_comments);
        let bridge = ProtocolBridge::new(repository.clone(), BridgeConfig::from(&settings.bridge));
        let gate = RawQueryGate::from_settings(&settings.raw_query);

        Self {
            settings,
            repository,
            loader,
            proto,
            composer,
            bridge,
            gate,
        }
    }

    /// Build a runtime using the provider named in `[loader]`.
    pub async fn from_settings(settings: Settings) -> RuntimeResult<Self> {
        let provider: Arc<dyn DataProvider> = match settings.loader.provider {
            ProviderKind::File => {
                Arc::new(JsonFileProvider::new(settings.provider.file.resolved_path()?))
            }
            ProviderKind::Worker => {
                Arc::new(WorkerProvider::connect(&settings.provider.worker).await?)
            }
        };
        info!(provider = provider.name(), "runtime configured");
        Ok(Self::new(settings, provider))
    }

    /// Run the startup load. `Ok(None)` when loading is disabled.
    pub async fn start(&self, cancel: &Cancellation) -> RuntimeResult<Option<LoadReport>> {
        Ok(self.loader.start(cancel).await?)
    }

    /// Reload metadata. Calls already holding a snapshot keep using it.
    pub async fn reload(&self, cancel: &Cancellation) -> RuntimeResult<LoadReport> {
        Ok(self.loader.reload(cancel).await?)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn repository(&self) -> &Arc<EntityRepository> {
        &self.repository
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.repository.snapshot()
    }

    /// proto3 IDL for every entity currently loaded.
    pub fn proto_schema(&self) -> String {
        self.proto.generate_snapshot(&self.snapshot())
    }

    /// GraphQL SDL for every entity currently loaded.
    pub fn graphql_schema(&self) -> String {
        self.composer.compose(&self.snapshot())
    }

    pub fn composer_mut(&mut self) -> &mut SchemaComposer {
        &mut self.composer
    }

    pub fn bridge(&self) -> &ProtocolBridge {
        &self.bridge
    }

    /// Register service tables here before serving.
    pub fn bridge_mut(&mut self) -> &mut ProtocolBridge {
        &mut self.bridge
    }

    pub fn gate(&self) -> &RawQueryGate {
        &self.gate
    }
}
