//! Raw query classification and authorization.
//!
//! Callers build a [`RawQueryContext`] from query text and caller details,
//! then ask a [`RawQueryGate`] whether it may run. Execution happens
//! elsewhere.

mod classify;
mod policy;

pub use classify::{classify, classify_statements, QueryKind};
pub use policy::{
    policy_from_settings, AllowAllPolicy, DenyAllPolicy, PolicyDenied, RawQueryContext,
    RawQueryGate, RawQueryPolicy, RoleOverridePolicy, SelectOnlyPolicy,
};
