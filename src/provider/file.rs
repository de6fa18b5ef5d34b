use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{DataProvider, ProviderError, ProviderResult};
use crate::loader::Cancellation;
use crate::metadata::{EntityConfiguration, EntityDocument};

/// Provider that reads an [`EntityDocument`] from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DataProvider for JsonFileProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn load_entities(&self, cancel: &Cancellation) -> ProviderResult<Vec<EntityConfiguration>> {
        ProviderError::check(cancel)?;

        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ProviderError::Io {
                path: self.path.clone(),
                source,
            })?;

        ProviderError::check(cancel)?;

        let document = EntityDocument::from_json(&text).map_err(|e| ProviderError::Malformed {
            provider: format!("file:{}", self.path.display()),
            message: e.to_string(),
        })?;

        Ok(document.entities)
    }
}
