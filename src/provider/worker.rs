//! Provider backed by the schema worker.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{DataProvider, ProviderError, ProviderResult};
use crate::config::{SettingsError, WorkerSettings};
use crate::loader::Cancellation;
use crate::metadata::{
    DataType, EntityConfiguration, IndexConfiguration, MetadataResult, PropertyConfiguration,
    RelationshipConfiguration, RelationshipKind,
};
use crate::worker::protocol::{ConnectionParams, IndexInfo, TableDetailInfo};
use crate::worker::{WorkerClient, WorkerError};

/// [`DataProvider`] that introspects a live database through the worker.
///
/// Every table in the configured schema becomes one entity. Tables are
/// fetched one at a time and cancellation is checked between them.
///
/// # Example
///
/// ```ignore
/// let client = WorkerClient::spawn("./schema-worker").await?;
/// let provider = WorkerProvider::new(Arc::new(client), "postgres", "postgres://localhost/shop")
///     .with_schema("public");
/// ```
pub struct WorkerProvider {
    client: Arc<WorkerClient>,
    connection: ConnectionParams,
    schema: Option<String>,
}

impl WorkerProvider {
    pub fn new(
        client: Arc<WorkerClient>,
        driver: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self {
            client,
            connection: ConnectionParams {
                driver: driver.into(),
                connection_string: connection_string.into(),
            },
            schema: None,
        }
    }

    /// Restrict introspection to one schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Spawn the worker described by `[provider.worker]` and wrap it.
    pub async fn connect(settings: &WorkerSettings) -> ProviderResult<Self> {
        let connection_string = settings
            .resolved_connection_string()
            .map_err(|e| unreachable_from_settings(&e))?;
        let client = WorkerClient::spawn_with_settings(settings)
            .await
            .map_err(classify)?;

        let provider = Self::new(Arc::new(client), &settings.driver, connection_string);
        Ok(match &settings.schema {
            Some(schema) => provider.with_schema(schema),
            None => provider,
        })
    }

    pub fn driver(&self) -> &str {
        &self.connection.driver
    }
}

fn unreachable_from_settings(error: &SettingsError) -> ProviderError {
    ProviderError::Unreachable {
        provider: "worker".to_string(),
        message: error.to_string(),
    }
}

/// Transport failures mean the source is unreachable; anything else is
/// reported as the worker error it is.
fn classify(error: WorkerError) -> ProviderError {
    if error.is_unreachable() {
        ProviderError::Unreachable {
            provider: "worker".to_string(),
            message: error.to_string(),
        }
    } else {
        ProviderError::Worker(error)
    }
}

#[async_trait]
impl DataProvider for WorkerProvider {
    fn name(&self) -> &str {
        "worker"
    }

    async fn load_entities(&self, cancel: &Cancellation) -> ProviderResult<Vec<EntityConfiguration>> {
        ProviderError::check(cancel)?;

        let tables = self
            .client
            .list_tables(&self.connection, self.schema.as_deref())
            .await
            .map_err(classify)?
            .tables;

        let mut entities = Vec::with_capacity(tables.len());
        for table in tables {
            ProviderError::check(cancel)?;

            let detail = self
                .client
                .get_table(&self.connection, &table.schema, &table.name)
                .await
                .map_err(classify)?
                .table;
            let indexes = self
                .client
                .get_indexes(&self.connection, &table.schema, &table.name)
                .await
                .map_err(classify)?
                .indexes;

            debug!(schema = %detail.schema, table = %detail.name, columns = detail.columns.len(), "introspected table");
            entities.push(entity_from_table(&detail, &indexes)?);
        }

        Ok(entities)
    }
}

/// Convert worker table metadata into an entity.
///
/// Columns become properties in ordinal order. Foreign keys become
/// many-to-one relationships named after the referenced table. Indexes that
/// back the primary key are skipped, as are included (non-key) index columns.
pub fn entity_from_table(
    table: &TableDetailInfo,
    indexes: &[IndexInfo],
) -> MetadataResult<EntityConfiguration> {
    let key_columns: HashSet<&str> = table
        .primary_key
        .iter()
        .flat_map(|pk| pk.columns.iter().map(String::as_str))
        .collect();
    let fk_columns: HashSet<&str> = table
        .foreign_keys
        .iter()
        .flat_map(|fk| fk.columns.iter().map(String::as_str))
        .collect();

    let mut columns: Vec<_> = table.columns.iter().collect();
    columns.sort_by_key(|c| c.position);

    let properties = columns.into_iter().map(|column| {
        let mut property = PropertyConfiguration::new(&column.name, DataType::parse(&column.data_type));
        property.nullable = column.is_nullable;
        property.generated = column.is_identity || column.is_computed;
        property.max_length = column.max_length.and_then(|len| u32::try_from(len).ok()).filter(|&len| len > 0);
        if key_columns.contains(column.name.as_str()) {
            property = property.primary_key();
        }
        if fk_columns.contains(column.name.as_str()) {
            property = property.foreign_key();
        }
        property
    });

    let mut builder = EntityConfiguration::builder(&table.name)
        .schema(&table.schema)
        .properties(properties);

    let mut relationship_names = HashSet::new();
    for fk in &table.foreign_keys {
        let name = if relationship_names.insert(fk.referenced_table.clone()) {
            fk.referenced_table.clone()
        } else {
            fk.name.clone()
        };
        let relationship = fk
            .columns
            .iter()
            .zip(&fk.referenced_columns)
            .fold(
                RelationshipConfiguration::new(name, &fk.referenced_table, RelationshipKind::ManyToOne),
                |rel, (foreign, principal)| rel.key(foreign, principal),
            );
        builder = builder.relationship(relationship);
    }

    for index in indexes.iter().filter(|i| !i.is_primary_key) {
        let mut key_columns: Vec<_> = index.columns.iter().filter(|c| !c.is_included).collect();
        if key_columns.is_empty() {
            continue;
        }
        key_columns.sort_by_key(|c| c.position);

        let mut config = IndexConfiguration::new(&index.name, key_columns.iter().map(|c| c.name.as_str()));
        if index.is_unique {
            config = config.unique();
        }
        if index.is_clustered {
            config = config.clustered();
        }
        builder = builder.index(config);
    }

    builder.build()
}
