#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use dynapi::config::{RawQueryPolicyKind, RawQuerySettings};
    use dynapi::rawquery::{
        classify, AllowAllPolicy, DenyAllPolicy, PolicyDenied, QueryKind, RawQueryContext,
        RawQueryGate, RawQueryPolicy, SelectOnlyPolicy,
    };

    fn gate(policy: impl RawQueryPolicy + 'static) -> RawQueryGate {
        RawQueryGate::new(Arc::new(policy))
    }

    async fn allowed(gate: &RawQueryGate, sql: &str) -> bool {
        gate.can_execute(&RawQueryContext::new(sql)).await
    }

    #[test]
    fn test_classification_examples() {
        assert_eq!(classify("SELECT * FROM t"), QueryKind::Select);
        assert_eq!(
            classify("  -- comment\nINSERT INTO t (a) VALUES (1)"),
            QueryKind::Insert
        );
        assert_eq!(classify(""), QueryKind::Unknown);
    }

    #[tokio::test]
    async fn test_default_policy_scenario() {
        let gate = RawQueryGate::default();
        assert_eq!(gate.policy_name(), "select_only");
        assert!(allowed(&gate, "SELECT 1").await);
        assert!(!allowed(&gate, "DROP TABLE t").await);
    }

    #[tokio::test]
    async fn test_deny_all_scenario() {
        let gate = gate(DenyAllPolicy);
        assert!(!allowed(&gate, "SELECT 1").await);
        assert!(!allowed(&gate, "DROP TABLE t").await);
    }

    #[tokio::test]
    async fn test_allow_all_scenario() {
        let gate = gate(AllowAllPolicy::new());
        assert!(allowed(&gate, "SELECT 1").await);
        assert!(allowed(&gate, "DROP TABLE t").await);
    }

    #[tokio::test]
    async fn test_select_only_sees_every_statement() {
        let gate = gate(SelectOnlyPolicy);
        assert!(allowed(&gate, "/* report */ SELECT a FROM t; SELECT b FROM u;").await);
        assert!(!allowed(&gate, "SELECT 1; DELETE FROM t").await);
        assert!(!allowed(&gate, "SELECT ';' ; TRUNCATE t").await);
        assert!(allowed(&gate, "WITH x AS (SELECT 1 AS a) SELECT a FROM x").await);
    }

    #[tokio::test]
    async fn test_select_only_denies_data_modifying_ctes() {
        let gate = RawQueryGate::default();
        for sql in [
            "WITH d AS (INSERT INTO t VALUES (1) RETURNING *) SELECT * FROM d",
            "WITH d AS (UPDATE t SET a = 1 RETURNING *) SELECT * FROM d",
        ] {
            assert!(!allowed(&gate, sql).await, "allowed: {sql}");
        }

        let err = gate
            .authorize(&RawQueryContext::new(
                "WITH d AS (UPDATE t SET a = 1 RETURNING *) SELECT * FROM d",
            ))
            .await
            .unwrap_err();
        assert_eq!(err.kind, QueryKind::Update);
    }

    #[tokio::test]
    async fn test_select_only_denies_grants() {
        let gate = RawQueryGate::default();
        assert!(!allowed(&gate, "GRANT SELECT ON t TO reporting").await);
    }

    #[tokio::test]
    async fn test_authorize_returns_policy_denied() {
        let gate = gate(DenyAllPolicy);
        let err = gate
            .authorize(&RawQueryContext::new("SELECT 1"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PolicyDenied {
                policy: "deny_all".into(),
                kind: QueryKind::Select
            }
        );
    }

    #[tokio::test]
    async fn test_admin_roles_from_settings() {
        let settings = RawQuerySettings {
            policy: RawQueryPolicyKind::SelectOnly,
            admin_roles: vec!["dba".into()],
        };
        let gate = RawQueryGate::from_settings(&settings);

        let drop = RawQueryContext::new("DROP TABLE t").with_user("u-7");
        assert!(!gate.can_execute(&drop).await);
        assert!(gate.can_execute(&drop.with_role("DBA")).await);
    }

    /// Allows writes only against one database.
    struct SandboxPolicy;

    #[async_trait]
    impl RawQueryPolicy for SandboxPolicy {
        fn name(&self) -> &str {
            "sandbox"
        }

        async fn can_execute(&self, ctx: &RawQueryContext) -> bool {
            ctx.kind() == QueryKind::Select || ctx.database() == Some("sandbox")
        }
    }

    #[tokio::test]
    async fn test_custom_policy_sees_context() {
        let gate = gate(SandboxPolicy);
        let insert = RawQueryContext::new("INSERT INTO t VALUES (1)").with_table("t");
        assert!(!gate.can_execute(&insert).await);
        assert!(gate.can_execute(&insert.with_database("sandbox")).await);
    }
}
