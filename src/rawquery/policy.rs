//! Authorization policies for raw queries.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use super::classify::{classify, classify_statements, QueryKind};
use crate::config::{RawQueryPolicyKind, RawQuerySettings};

/// Everything a policy may inspect about a raw query.
#[derive(Debug, Clone)]
pub struct RawQueryContext {
    query: String,
    kind: QueryKind,
    statements: Vec<QueryKind>,
    database: Option<String>,
    table: Option<String>,
    user_id: Option<String>,
    roles: BTreeSet<String>,
}

impl RawQueryContext {
    /// Classify `query` and start a context with no caller details.
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            kind: classify(&query),
            statements: classify_statements(&query),
            query,
            database: None,
            table: None,
            user_id: None,
            roles: BTreeSet::new(),
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Kind of the first statement.
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Kinds of every non-empty statement, in order.
    pub fn statement_kinds(&self) -> &[QueryKind] {
        &self.statements
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }

    /// Case-insensitive role check.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// First statement that is not a plain read.
    fn first_write(&self) -> Option<QueryKind> {
        self.statements.iter().copied().find(|k| !k.is_read_only())
    }
}

/// Decides whether a raw query may run.
#[async_trait]
pub trait RawQueryPolicy: Send + Sync {
    fn name(&self) -> &str;

    async fn can_execute(&self, ctx: &RawQueryContext) -> bool;
}

/// Allows a query only when every statement is a `SELECT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectOnlyPolicy;

#[async_trait]
impl RawQueryPolicy for SelectOnlyPolicy {
    fn name(&self) -> &str {
        "select_only"
    }

    async fn can_execute(&self, ctx: &RawQueryContext) -> bool {
        !ctx.statement_kinds().is_empty() && ctx.first_write().is_none()
    }
}

/// Allows everything.
#[derive(Debug, Clone, Copy)]
pub struct AllowAllPolicy {
    _private: (),
}

impl AllowAllPolicy {
    pub fn new() -> Self {
        warn!("raw query policy allows all statements, including writes and DDL");
        Self { _private: () }
    }
}

impl Default for AllowAllPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RawQueryPolicy for AllowAllPolicy {
    fn name(&self) -> &str {
        "allow_all"
    }

    async fn can_execute(&self, _ctx: &RawQueryContext) -> bool {
        true
    }
}

/// Refuses everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllPolicy;

#[async_trait]
impl RawQueryPolicy for DenyAllPolicy {
    fn name(&self) -> &str {
        "deny_all"
    }

    async fn can_execute(&self, _ctx: &RawQueryContext) -> bool {
        false
    }
}

/// Lets callers holding any listed role through; defers to `inner` otherwise.
pub struct RoleOverridePolicy {
    roles: Vec<String>,
    inner: Arc<dyn RawQueryPolicy>,
}

impl RoleOverridePolicy {
    pub fn new<I, S>(roles: I, inner: Arc<dyn RawQueryPolicy>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            inner,
        }
    }
}

#[async_trait]
impl RawQueryPolicy for RoleOverridePolicy {
    fn name(&self) -> &str {
        "role_override"
    }

    async fn can_execute(&self, ctx: &RawQueryContext) -> bool {
        if self.roles.iter().any(|role| ctx.has_role(role)) {
            return true;
        }
        self.inner.can_execute(ctx).await
    }
}

/// Build the configured policy.
pub fn policy_from_settings(settings: &RawQuerySettings) -> Arc<dyn RawQueryPolicy> {
    let base: Arc<dyn RawQueryPolicy> = match settings.policy {
        RawQueryPolicyKind::SelectOnly => Arc::new(SelectOnlyPolicy),
        RawQueryPolicyKind::AllowAll => Arc::new(AllowAllPolicy::new()),
        RawQueryPolicyKind::DenyAll => Arc::new(DenyAllPolicy),
    };
    if settings.admin_roles.is_empty() {
        base
    } else {
        Arc::new(RoleOverridePolicy::new(settings.admin_roles.iter().cloned(), base))
    }
}

/// A raw query refused by policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("raw {kind} query refused by {policy} policy")]
pub struct PolicyDenied {
    pub policy: String,
    pub kind: QueryKind,
}

/// Single authorization point for raw queries. Never executes anything.
#[derive(Clone)]
pub struct RawQueryGate {
    policy: Arc<dyn RawQueryPolicy>,
}

impl Default for RawQueryGate {
    fn default() -> Self {
        Self::new(Arc::new(SelectOnlyPolicy))
    }
}

impl RawQueryGate {
    pub fn new(policy: Arc<dyn RawQueryPolicy>) -> Self {
        Self { policy }
    }

    pub fn from_settings(settings: &RawQuerySettings) -> Self {
        Self::new(policy_from_settings(settings))
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    pub async fn can_execute(&self, ctx: &RawQueryContext) -> bool {
        let allowed = self.policy.can_execute(ctx).await;
        debug!(
            policy = self.policy.name(),
            kind = %ctx.kind(),
            statements = ctx.statement_kinds().len(),
            user = ctx.user_id().unwrap_or("-"),
            allowed,
            "raw query decision"
        );
        allowed
    }

    /// Like [`can_execute`](Self::can_execute), but a refusal is an error.
    pub async fn authorize(&self, ctx: &RawQueryContext) -> Result<(), PolicyDenied> {
        if self.can_execute(ctx).await {
            return Ok(());
        }
        Err(PolicyDenied {
            policy: self.policy.name().to_string(),
            kind: ctx.first_write().unwrap_or(ctx.kind()),
        })
    }
}
