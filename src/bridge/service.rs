//! Explicit RPC method tables.
//!
//! A [`ServiceTable`] is built once per service at composition time. Each
//! entry records how the method is called (async, async with a call context,
//! blocking, or server streaming) together with a type-erased invoker that
//! builds the typed request, runs the handler and serialises the response.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{self, BoxFuture};
use futures::stream::{BoxStream, Stream, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::error::{BridgeError, BridgeResult};
use super::request::{build_request, Argument, BridgeArgs, RequestShape};

/// Service-level failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    FailedPrecondition,
    Unimplemented,
    Internal,
    Unavailable,
}

/// Failure reported by an RPC method.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code:?}: {message}")]
pub struct RpcStatus {
    pub code: StatusCode,
    pub message: String,
}

impl RpcStatus {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(StatusCode::AlreadyExists, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }
}

/// Per-call RPC context.
///
/// Calls arriving through the bridge have no transport behind them and get
/// [`CallContext::placeholder`].
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    metadata: BTreeMap<String, String>,
    placeholder: bool,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for calls that did not come from an RPC transport.
    pub fn placeholder() -> Self {
        Self {
            placeholder: true,
            ..Self::default()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// How a registered method is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Unary,
    UnaryWithContext,
    Blocking,
    ServerStreaming,
}

impl MethodKind {
    pub fn takes_context(self) -> bool {
        self == MethodKind::UnaryWithContext
    }

    pub fn is_streaming(self) -> bool {
        self == MethodKind::ServerStreaming
    }
}

type UnaryInvoker = Arc<
    dyn Fn(&BridgeArgs, &[Argument], CallContext) -> BridgeResult<BoxFuture<'static, BridgeResult<Value>>>
        + Send
        + Sync,
>;

type StreamInvoker = Arc<
    dyn Fn(&BridgeArgs, &[Argument]) -> BridgeResult<BoxStream<'static, BridgeResult<Value>>>
        + Send
        + Sync,
>;

#[derive(Clone)]
enum Invoker {
    Unary(UnaryInvoker),
    Stream(StreamInvoker),
}

#[derive(Clone)]
struct MethodEntry {
    kind: MethodKind,
    invoker: Invoker,
}

/// Method table of one RPC service.
///
/// ```ignore
/// let users = ServiceTable::new("UserService")
///     .unary("Get", move |req: GetUserRequest| {
///         let store = store.clone();
///         async move { store.get(req.id).ok_or_else(|| RpcStatus::not_found("no such user")) }
///     })
///     .blocking("List", |req: ListUserRequest| Ok(list(req)));
/// ```
#[derive(Clone)]
pub struct ServiceTable {
    name: String,
    methods: HashMap<String, MethodEntry>,
}

impl ServiceTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn kind(&self, method: &str) -> Option<MethodKind> {
        self.methods.get(method).map(|m| m.kind)
    }

    /// Register an async method taking only the request.
    pub fn unary<Req, Resp, F, Fut>(self, method: &str, handler: F) -> Self
    where
        Req: RequestShape,
        Resp: Serialize + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, RpcStatus>> + Send + 'static,
    {
        self.insert_unary(method, MethodKind::Unary, move |req: Req, _ctx| handler(req))
    }

    /// Register an async method taking the request and a [`CallContext`].
    pub fn unary_with_context<Req, Resp, F, Fut>(self, method: &str, handler: F) -> Self
    where
        Req: RequestShape,
        Resp: Serialize + 'static,
        F: Fn(Req, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, RpcStatus>> + Send + 'static,
    {
        self.insert_unary(method, MethodKind::UnaryWithContext, handler)
    }

    /// Register a method that returns its response directly.
    pub fn blocking<Req, Resp, F>(self, method: &str, handler: F) -> Self
    where
        Req: RequestShape,
        Resp: Serialize + Send + 'static,
        F: Fn(Req) -> Result<Resp, RpcStatus> + Send + Sync + 'static,
    {
        self.insert_unary(method, MethodKind::Blocking, move |req: Req, _ctx| {
            future::ready(handler(req))
        })
    }

    /// Register a server-streaming method.
    ///
    /// Streaming methods can be opened with [`ServiceTable::open_stream`] but
    /// are rejected by the resource bridge.
    pub fn server_streaming<Req, Resp, F, S>(mut self, method: &str, handler: F) -> Self
    where
        Req: RequestShape,
        Resp: Serialize + 'static,
        F: Fn(Req) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<Resp, RpcStatus>> + Send + 'static,
    {
        let service = self.name.clone();
        let name = method.to_string();
        let invoker: StreamInvoker = Arc::new(
            move |args: &BridgeArgs,
                  required: &[Argument]|
                  -> BridgeResult<BoxStream<'static, BridgeResult<Value>>> {
                let request = build_request::<Req>(args, required)?;
                let (service, name) = (service.clone(), name.clone());
                let stream = handler(request).map(move |item| {
                    item.map_err(BridgeError::from)
                        .and_then(|resp| to_json(&service, &name, &resp))
                });
                Ok(stream.boxed())
            },
        );

        self.methods.insert(
            method.to_string(),
            MethodEntry {
                kind: MethodKind::ServerStreaming,
                invoker: Invoker::Stream(invoker),
            },
        );
        self
    }

    fn insert_unary<Req, Resp, F, Fut>(mut self, method: &str, kind: MethodKind, handler: F) -> Self
    where
        Req: RequestShape,
        Resp: Serialize + 'static,
        F: Fn(Req, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, RpcStatus>> + Send + 'static,
    {
        let service = self.name.clone();
        let name = method.to_string();
        let invoker: UnaryInvoker = Arc::new(
            move |args: &BridgeArgs,
                  required: &[Argument],
                  ctx: CallContext|
                  -> BridgeResult<BoxFuture<'static, BridgeResult<Value>>> {
                let request = build_request::<Req>(args, required)?;
                let (service, name) = (service.clone(), name.clone());
                let call = handler(request, ctx);
                Ok(async move {
                    let resp = call.await?;
                    to_json(&service, &name, &resp)
                }
                .boxed())
            },
        );

        self.methods.insert(
            method.to_string(),
            MethodEntry {
                kind,
                invoker: Invoker::Unary(invoker),
            },
        );
        self
    }

    /// Call a unary method.
    pub(crate) async fn call(
        &self,
        method: &str,
        args: &BridgeArgs,
        required: &[Argument],
    ) -> BridgeResult<Value> {
        let entry = self.entry(method)?;
        match &entry.invoker {
            Invoker::Unary(invoke) => {
                let ctx = if entry.kind.takes_context() {
                    CallContext::placeholder()
                } else {
                    CallContext::default()
                };
                invoke(args, required, ctx)?.await
            }
            Invoker::Stream(_) => Err(BridgeError::UnexpectedReturnShape {
                service: self.name.clone(),
                method: method.to_string(),
                reason: "server-streaming methods are not supported by the bridge".to_string(),
            }),
        }
    }

    /// Open a server-streaming method.
    pub fn open_stream(
        &self,
        method: &str,
        args: &BridgeArgs,
        required: &[Argument],
    ) -> BridgeResult<BoxStream<'static, BridgeResult<Value>>> {
        let entry = self.entry(method)?;
        match &entry.invoker {
            Invoker::Stream(open) => open(args, required),
            Invoker::Unary(_) => Err(BridgeError::UnexpectedReturnShape {
                service: self.name.clone(),
                method: method.to_string(),
                reason: "method is unary".to_string(),
            }),
        }
    }

    fn entry(&self, method: &str) -> BridgeResult<&MethodEntry> {
        self.methods
            .get(method)
            .ok_or_else(|| BridgeError::MethodNotFound {
                service: self.name.clone(),
                method: method.to_string(),
            })
    }
}

fn to_json<T: Serialize>(service: &str, method: &str, value: &T) -> BridgeResult<Value> {
    serde_json::to_value(value).map_err(|e| BridgeError::UnexpectedReturnShape {
        service: service.to_string(),
        method: method.to_string(),
        reason: format!("response cannot be represented as JSON: {e}"),
    })
}
