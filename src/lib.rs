//! # dynapi
//!
//! Schema-driven API surfaces over entity metadata that is only known at
//! runtime.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │   DataProvider (JSON file │ schema worker │ static)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [loader]
//! ┌─────────────────────────────────────────────────────────┐
//! │        EntityRepository (atomic Snapshot swap)           │
//! └─────────────────────────────────────────────────────────┘
//!            │                    │                    │
//!            ▼ [codegen]          ▼ [codegen]          ▼ [bridge]
//! ┌──────────────────┐ ┌──────────────────┐ ┌───────────────────────┐
//! │ proto3 IDL       │ │ GraphQL SDL      │ │ resource → RPC calls  │
//! └──────────────────┘ └──────────────────┘ └───────────────────────┘
//!
//!                 raw SQL ──▶ [rawquery] classify + policy gate
//! ```
//!
//! [`runtime::ApiRuntime`] wires the pieces together from
//! [`config::Settings`].

pub mod bridge;
pub mod codegen;
pub mod config;
pub mod loader;
pub mod metadata;
pub mod naming;
pub mod provider;
pub mod rawquery;
pub mod repository;
pub mod runtime;
pub mod telemetry;
pub mod worker;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::bridge::{
        map_verb, BridgeArgs, BridgeError, ProtocolBridge, RequestShape, ResourceCall, RpcMethod,
        ServiceTable,
    };
    pub use crate::codegen::{ProtoGenerator, SchemaComposer};
    pub use crate::config::Settings;
    pub use crate::loader::{cancellation, Cancellation, EntityLoader};
    pub use crate::metadata::{
        DataType, EntityConfiguration, PropertyConfiguration, RelationshipConfiguration,
        RelationshipKind,
    };
    pub use crate::provider::DataProvider;
    pub use crate::rawquery::{RawQueryContext, RawQueryGate};
    pub use crate::repository::{EntityRepository, Snapshot};
    pub use crate::runtime::ApiRuntime;
}
