//! Request construction by capability.
//!
//! Request types opt into the arguments they can hold by overriding the
//! matching [`RequestShape`] setter. [`build_request`] offers every argument
//! the call carries; a shape that does not override a setter simply skips
//! that argument. Only arguments the method requires must be placed.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::error::{BridgeError, BridgeResult};

/// The arguments a resource call can supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Argument {
    Id,
    Entity,
    Page,
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Argument::Id => "id",
            Argument::Entity => "entity",
            Argument::Page => "page",
        })
    }
}

/// Whether a setter placed its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Bound,
    Skipped,
}

/// A value the shape accepts in principle but not in this form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("invalid id '{value}': {reason}")]
    InvalidId { value: String, reason: String },

    #[error("invalid entity body: {0}")]
    InvalidEntity(String),

    #[error("invalid page: {0}")]
    InvalidPage(String),
}

/// Capability interface of a bridgeable request type.
pub trait RequestShape: Default + Send + 'static {
    fn set_id(&mut self, _id: &str) -> Result<Binding, BindError> {
        Ok(Binding::Skipped)
    }

    fn set_entity(&mut self, _entity: &Value) -> Result<Binding, BindError> {
        Ok(Binding::Skipped)
    }

    fn set_page(&mut self, _page: Page) -> Result<Binding, BindError> {
        Ok(Binding::Skipped)
    }
}

/// Requests with no fields accept nothing.
impl RequestShape for () {}

/// One page of a list call. Page numbers start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// Rows to skip before this page.
    pub fn offset(&self) -> usize {
        self.number.saturating_sub(1) as usize * self.size as usize
    }
}

/// Loosely typed call arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeArgs {
    pub id: Option<String>,
    pub entity: Option<Value>,
    pub page: Option<Page>,
}

impl BridgeArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn entity(mut self, entity: Value) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn page(mut self, number: u32, size: u32) -> Self {
        self.page = Some(Page { number, size });
        self
    }

    fn has(&self, argument: Argument) -> bool {
        match argument {
            Argument::Id => self.id.is_some(),
            Argument::Entity => self.entity.is_some(),
            Argument::Page => self.page.is_some(),
        }
    }
}

/// Build a `T` from `args`.
///
/// Starts from `T::default()` and offers each present argument. Fails when a
/// `required` argument is absent or the shape has nowhere to put it, or when
/// the shape rejects a value.
pub fn build_request<T: RequestShape>(args: &BridgeArgs, required: &[Argument]) -> BridgeResult<T> {
    let mut request = T::default();
    let mut bound = Vec::with_capacity(3);

    let reject = |e: BindError| BridgeError::Invocation(e.to_string());

    if let Some(id) = &args.id {
        if request.set_id(id).map_err(reject)? == Binding::Bound {
            bound.push(Argument::Id);
        }
    }
    if let Some(entity) = &args.entity {
        if request.set_entity(entity).map_err(reject)? == Binding::Bound {
            bound.push(Argument::Entity);
        }
    }
    if let Some(page) = args.page {
        if request.set_page(page).map_err(reject)? == Binding::Bound {
            bound.push(Argument::Page);
        }
    }

    for argument in required {
        if !args.has(*argument) {
            return Err(BridgeError::Invocation(format!(
                "missing required argument '{argument}'"
            )));
        }
        if !bound.contains(argument) {
            return Err(BridgeError::Invocation(format!(
                "{} has no field for required argument '{argument}'",
                short_type_name::<T>()
            )));
        }
    }

    Ok(request)
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Parse an id segment into the key type a shape stores.
pub fn parse_id<I>(raw: &str) -> Result<I, BindError>
where
    I: FromStr,
    I::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: I::Err| BindError::InvalidId {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Deserialize an entity body into the message type a shape stores.
pub fn parse_entity<E: DeserializeOwned>(entity: &Value) -> Result<E, BindError> {
    E::deserialize(entity).map_err(|e| BindError::InvalidEntity(e.to_string()))
}
