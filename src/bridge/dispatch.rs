use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::error::{BridgeError, BridgeResult};
use super::request::{Argument, BridgeArgs, Page};
use super::service::ServiceTable;
use super::verb::{map_verb, RpcMethod};
use crate::config::BridgeSettings;
use crate::naming::service_name;
use crate::repository::EntityRepository;

/// Paging and routing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub path_prefix: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::from(&BridgeSettings::default())
    }
}

impl From<&BridgeSettings> for BridgeConfig {
    fn from(settings: &BridgeSettings) -> Self {
        Self {
            path_prefix: settings.path_prefix.clone(),
            default_page_size: settings.default_page_size,
            max_page_size: settings.max_page_size,
        }
    }
}

impl BridgeConfig {
    /// Apply defaults and bounds to requested paging.
    pub fn page(&self, number: Option<u32>, size: Option<u32>) -> Page {
        let max = self.max_page_size.max(1);
        Page {
            number: number.unwrap_or(1).max(1),
            size: size.unwrap_or(self.default_page_size).clamp(1, max),
        }
    }
}

/// A resource-oriented call: `VERB /prefix/{resource}[/{id}]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceCall {
    pub method: String,
    pub resource: String,
    pub id: Option<String>,
    pub body: Option<Value>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

impl ResourceCall {
    pub fn new(method: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            resource: resource.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_page(mut self, number: u32, size: u32) -> Self {
        self.page_number = Some(number);
        self.page_size = Some(size);
        self
    }

    /// Split a raw request into a call.
    ///
    /// `path` must start with `prefix` and name a resource, optionally
    /// followed by one id segment. `pageNumber` and `pageSize` are read from
    /// `query`; other keys are ignored. An empty `body` counts as absent.
    pub fn parse(
        method: &str,
        path: &str,
        query: Option<&str>,
        body: Option<&str>,
        prefix: &str,
    ) -> BridgeResult<Self> {
        let prefix = prefix.trim_matches('/');
        let path = path.trim_matches('/');

        let rest = if prefix.is_empty() {
            path
        } else {
            path.strip_prefix(prefix)
                .filter(|rest| rest.is_empty() || rest.starts_with('/'))
                .ok_or_else(|| {
                    BridgeError::MalformedCall(format!("path '/{path}' is not under '/{prefix}'"))
                })?
        };

        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        let (resource, id) = match segments.as_slice() {
            [resource] => (*resource, None),
            [resource, id] => (*resource, Some(id.to_string())),
            [] => return Err(BridgeError::MalformedCall("no resource in path".to_string())),
            _ => {
                return Err(BridgeError::MalformedCall(format!(
                    "too many path segments in '/{path}'"
                )))
            }
        };

        let mut call = ResourceCall::new(method.trim(), resource);
        call.id = id;

        for pair in query.unwrap_or("").split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let target = if key.eq_ignore_ascii_case("pageNumber") {
                &mut call.page_number
            } else if key.eq_ignore_ascii_case("pageSize") {
                &mut call.page_size
            } else {
                continue;
            };
            *target = Some(value.parse().map_err(|_| {
                BridgeError::MalformedCall(format!("{key} must be a positive integer, got '{value}'"))
            })?);
        }

        if let Some(text) = body.filter(|b| !b.trim().is_empty()) {
            let value = serde_json::from_str(text)
                .map_err(|e| BridgeError::MalformedCall(format!("body is not valid JSON: {e}")))?;
            call.body = Some(value);
        }

        Ok(call)
    }
}

/// Routes resource calls onto registered RPC service tables.
///
/// Entity resolution reads the repository snapshot current at the start of
/// each call; a reload during the call does not affect it.
pub struct ProtocolBridge {
    repository: Arc<EntityRepository>,
    services: HashMap<String, ServiceTable>,
    config: BridgeConfig,
}

impl ProtocolBridge {
    pub fn new(repository: Arc<EntityRepository>, config: BridgeConfig) -> Self {
        Self {
            repository,
            services: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Register a service table, returning any table it replaces.
    pub fn register(&mut self, table: ServiceTable) -> Option<ServiceTable> {
        self.services.insert(table.name().to_string(), table)
    }

    pub fn service(&self, name: &str) -> Option<&ServiceTable> {
        self.services.get(name)
    }

    /// Invoke `service.method` with loosely typed arguments.
    pub async fn invoke(
        &self,
        service: &str,
        method: &str,
        args: &BridgeArgs,
        required: &[Argument],
    ) -> BridgeResult<Value> {
        let table = self
            .services
            .get(service)
            .ok_or_else(|| BridgeError::MethodNotFound {
                service: service.to_string(),
                method: method.to_string(),
            })?;
        table.call(method, args, required).await
    }

    /// Resolve, map and invoke a resource call.
    pub async fn dispatch(&self, call: &ResourceCall) -> BridgeResult<Value> {
        let snapshot = self.repository.snapshot();
        let entity = snapshot
            .resolve_resource(&call.resource)
            .ok_or_else(|| BridgeError::EntityNotFound(call.resource.clone()))?;

        let method = map_verb(&call.method, call.id.is_some())?;
        let service = service_name(entity.name());

        let args = BridgeArgs {
            id: call.id.clone(),
            entity: call.body.clone(),
            page: (method == RpcMethod::List)
                .then(|| self.config.page(call.page_number, call.page_size)),
        };

        debug!(
            resource = %call.resource,
            entity = entity.name(),
            service = %service,
            method = %method,
            generation = snapshot.generation(),
            "dispatching resource call"
        );

        self.invoke(&service, method.as_str(), &args, method.required_arguments())
            .await
    }
}
