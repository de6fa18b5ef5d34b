//! Resource-to-RPC bridge.
//!
//! Lets the resource-oriented surface reuse RPC service implementations
//! instead of duplicating every handler:
//!
//! ```text
//! GET /api/users/7
//!   │ ResourceCall::parse
//!   ▼
//! resolve "users" → User      (repository snapshot)
//! map_verb(GET, id) → Get
//! service_name(User) → UserService
//!   │ build_request::<GetUserRequest>(id = "7")
//!   ▼
//! ServiceTable["UserService"]["Get"] → serde_json::Value
//! ```
//!
//! Shape compatibility is checked when a call arrives, not at compile time.
//! Mismatches surface as [`BridgeError`]s and are never retried.

mod dispatch;
mod error;
mod request;
mod service;
mod verb;

pub use dispatch::{BridgeConfig, ProtocolBridge, ResourceCall};
pub use error::{BridgeError, BridgeResult};
pub use request::{
    build_request, parse_entity, parse_id, Argument, BindError, Binding, BridgeArgs, Page,
    RequestShape,
};
pub use service::{CallContext, MethodKind, RpcStatus, ServiceTable, StatusCode};
pub use verb::{map_verb, RpcMethod};
