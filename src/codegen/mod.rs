//! Interface document generation.
//!
//! Both generators are pure functions of a [`Snapshot`](crate::repository::Snapshot):
//! they hold no state between calls and never touch the repository
//! themselves.
//!
//! - [`ProtoGenerator`] emits proto3 messages and one `{Entity}Service` per entity
//! - [`SchemaComposer`] emits GraphQL SDL with roots built from [`RootFieldProvider`]s

pub mod format;
mod graphql;
mod proto;

pub use graphql::{
    graph_type, input_type_name, Argument, CrudFieldProvider, RootField, RootFieldProvider,
    SchemaComposer,
};
pub use proto::{id_type, proto_type, ProtoGenerator, ProtoOptions};
