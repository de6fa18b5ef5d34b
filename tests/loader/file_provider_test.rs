use std::io::Write;
use std::sync::Arc;

use dynapi::config::LoaderSettings;
use dynapi::loader::{Cancellation, EntityLoader, LoadError};
use dynapi::metadata::DataType;
use dynapi::provider::{DataProvider, JsonFileProvider, ProviderError};
use dynapi::repository::EntityRepository;
use tempfile::NamedTempFile;

const USERS: &str = r#"{
    "entities": [
        {
            "name": "User",
            "properties": [
                { "name": "Id", "type": "bigint", "primary_key": true },
                { "name": "Name", "type": "varchar(100)", "nullable": false }
            ]
        }
    ]
}"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_reads_entities_from_file() {
    let file = write_temp(USERS);
    let provider = JsonFileProvider::new(file.path());

    let entities = provider.load_entities(&Cancellation::never()).await.unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].name(), "User");
    assert_eq!(
        entities[0].property("Name").unwrap().data_type,
        DataType::Varchar(100)
    );
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let provider = JsonFileProvider::new(dir.path().join("nope.json"));

    let err = provider
        .load_entities(&Cancellation::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Io { .. }));
}

#[tokio::test]
async fn test_malformed_file() {
    let file = write_temp("{ \"entities\": [ { \"properties\": [] } ] }");
    let provider = JsonFileProvider::new(file.path());

    let err = provider
        .load_entities(&Cancellation::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Malformed { .. }));
}

#[tokio::test]
async fn test_reload_picks_up_file_changes() {
    let mut file = write_temp(USERS);
    let loader = EntityLoader::new(
        Arc::new(JsonFileProvider::new(file.path())),
        Arc::new(EntityRepository::new()),
        LoaderSettings::default(),
    );
    let never = Cancellation::never();

    loader.start(&never).await.unwrap();
    assert!(loader.repository().get("User").is_some());

    let orders = r#"{ "entities": [ { "name": "Order", "properties": [] } ] }"#;
    std::fs::write(file.path(), orders).unwrap();
    file.flush().unwrap();

    loader.reload(&never).await.unwrap();
    assert!(loader.repository().get("User").is_none());
    assert!(loader.repository().get("Order").is_some());

    std::fs::write(file.path(), "not json").unwrap();
    let err = loader.reload(&never).await.unwrap_err();
    assert!(matches!(err, LoadError::Provider(ProviderError::Malformed { .. })));
    assert!(loader.repository().get("Order").is_some());
}
