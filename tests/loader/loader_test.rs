use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dynapi::config::LoaderSettings;
use dynapi::loader::{cancellation, Cancellation, EntityLoader, LoadError};
use dynapi::metadata::{DataType, EntityConfiguration, PropertyConfiguration};
use dynapi::provider::{DataProvider, ProviderError, ProviderResult, StaticProvider};
use dynapi::repository::EntityRepository;

fn entity(name: &str) -> EntityConfiguration {
    EntityConfiguration::builder(name)
        .property(PropertyConfiguration::new("Id", DataType::Int32).primary_key())
        .build()
        .unwrap()
}

/// Returns a different entity set on each call, or fails when told to.
struct ScriptedProvider {
    loads: Vec<ProviderResult<Vec<EntityConfiguration>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(loads: Vec<ProviderResult<Vec<EntityConfiguration>>>) -> Self {
        Self {
            loads,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn load_entities(&self, _cancel: &Cancellation) -> ProviderResult<Vec<EntityConfiguration>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.loads[call] {
            Ok(entities) => Ok(entities.clone()),
            Err(_) => Err(ProviderError::Unreachable {
                provider: "scripted".into(),
                message: "connection refused".into(),
            }),
        }
    }
}

/// Never finishes unless cancelled.
struct HangingProvider;

#[async_trait]
impl DataProvider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn load_entities(&self, _cancel: &Cancellation) -> ProviderResult<Vec<EntityConfiguration>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

fn loader(provider: Arc<dyn DataProvider>) -> EntityLoader {
    EntityLoader::new(provider, Arc::new(EntityRepository::new()), LoaderSettings::default())
}

fn names(loader: &EntityLoader) -> Vec<String> {
    loader
        .repository()
        .list()
        .iter()
        .map(|e| e.name().to_string())
        .collect()
}

#[tokio::test]
async fn test_start_loads_in_provider_order() {
    let loader = loader(Arc::new(StaticProvider::new(vec![
        entity("Order"),
        entity("User"),
    ])));

    let report = loader.start(&Cancellation::never()).await.unwrap().unwrap();
    assert_eq!(report.provider, "static");
    assert_eq!(report.entities, 2);
    assert_eq!(report.generation, 1);
    assert_eq!(names(&loader), ["Order", "User"]);
}

#[tokio::test]
async fn test_disabled_loader_leaves_repository_empty() {
    let settings = LoaderSettings {
        enabled: false,
        ..LoaderSettings::default()
    };
    let loader = EntityLoader::new(
        Arc::new(StaticProvider::new(vec![entity("User")])),
        Arc::new(EntityRepository::new()),
        settings,
    );

    assert!(loader.start(&Cancellation::never()).await.unwrap().is_none());
    assert!(names(&loader).is_empty());
}

#[tokio::test]
async fn test_reload_replaces_and_failure_keeps_previous() {
    let provider = ScriptedProvider::new(vec![
        Ok(vec![entity("User"), entity("Order")]),
        Ok(vec![entity("Invoice")]),
        Err(ProviderError::Cancelled),
    ]);
    let loader = loader(Arc::new(provider));
    let never = Cancellation::never();

    loader.start(&never).await.unwrap();
    assert_eq!(names(&loader), ["User", "Order"]);

    let report = loader.reload(&never).await.unwrap();
    assert_eq!(report.generation, 2);
    assert_eq!(names(&loader), ["Invoice"]);

    let err = loader.reload(&never).await.unwrap_err();
    assert!(matches!(err, LoadError::Provider(ProviderError::Unreachable { .. })));
    assert_eq!(names(&loader), ["Invoice"]);
    assert_eq!(loader.repository().generation(), 2);
}

#[tokio::test]
async fn test_cancel_before_start() {
    let loader = loader(Arc::new(StaticProvider::new(vec![entity("User")])));
    let (handle, cancel) = cancellation();
    handle.cancel();

    let err = loader.start(&cancel).await.unwrap_err();
    assert!(matches!(err, LoadError::Cancelled));
    assert!(names(&loader).is_empty());
}

#[tokio::test]
async fn test_cancel_interrupts_slow_provider() {
    let loader = Arc::new(loader(Arc::new(HangingProvider)));
    let (handle, cancel) = cancellation();

    let task = {
        let loader = Arc::clone(&loader);
        tokio::spawn(async move { loader.load(&cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("load did not observe cancellation")
        .unwrap();
    assert!(matches!(result, Err(LoadError::Cancelled)));
    assert_eq!(loader.repository().generation(), 0);
}
