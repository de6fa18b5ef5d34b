use async_trait::async_trait;

use super::{DataProvider, ProviderError, ProviderResult};
use crate::loader::Cancellation;
use crate::metadata::EntityConfiguration;

/// Provider over a fixed, in-memory entity list.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    entities: Vec<EntityConfiguration>,
}

impl StaticProvider {
    pub fn new(entities: Vec<EntityConfiguration>) -> Self {
        Self { entities }
    }
}

#[async_trait]
impl DataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn load_entities(&self, cancel: &Cancellation) -> ProviderResult<Vec<EntityConfiguration>> {
        ProviderError::check(cancel)?;
        Ok(self.entities.clone())
    }
}
