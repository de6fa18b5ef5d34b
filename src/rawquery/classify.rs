//! Leading-keyword classification of raw SQL text.

use std::fmt;

use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// The kind of statement a raw query performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Create,
    Alter,
    Drop,
    Truncate,
    Execute,
    Unknown,
}

impl QueryKind {
    /// Whether the statement only reads.
    pub fn is_read_only(self) -> bool {
        matches!(self, QueryKind::Select)
    }

    fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" => QueryKind::Select,
            "INSERT" | "REPLACE" => QueryKind::Insert,
            "UPDATE" => QueryKind::Update,
            "DELETE" => QueryKind::Delete,
            "MERGE" | "UPSERT" => QueryKind::Merge,
            "CREATE" => QueryKind::Create,
            "ALTER" => QueryKind::Alter,
            "DROP" => QueryKind::Drop,
            "TRUNCATE" => QueryKind::Truncate,
            "EXEC" | "EXECUTE" | "CALL" => QueryKind::Execute,
            _ => QueryKind::Unknown,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryKind::Select => "SELECT",
            QueryKind::Insert => "INSERT",
            QueryKind::Update => "UPDATE",
            QueryKind::Delete => "DELETE",
            QueryKind::Merge => "MERGE",
            QueryKind::Create => "CREATE",
            QueryKind::Alter => "ALTER",
            QueryKind::Drop => "DROP",
            QueryKind::Truncate => "TRUNCATE",
            QueryKind::Execute => "EXECUTE",
            QueryKind::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Classify a query by its first keyword.
///
/// Whitespace, comments and opening parentheses before the keyword are
/// skipped. Common table expressions are parsed and classified by the first
/// non-read found in any CTE body or the statement they feed; anything that
/// does not parse is `Unknown`.
pub fn classify(query: &str) -> QueryKind {
    let rest = skip_trivia(query);
    let keyword: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if keyword.eq_ignore_ascii_case("WITH") {
        return classify_cte(rest);
    }
    QueryKind::from_keyword(&keyword)
}

/// Classify every `;`-separated statement in `query`, skipping empty ones.
pub fn classify_statements(query: &str) -> Vec<QueryKind> {
    split_statements(query)
        .into_iter()
        .map(classify)
        .collect()
}

fn classify_cte(query: &str) -> QueryKind {
    let statements = match Parser::parse_sql(&GenericDialect {}, query) {
        Ok(statements) => statements,
        Err(_) => return QueryKind::Unknown,
    };

    match statements.first() {
        Some(Statement::Query(query)) => query_kind(query),
        _ => QueryKind::Unknown,
    }
}

/// Postgres allows `INSERT`/`UPDATE` inside a CTE, so every body counts.
fn query_kind(query: &Query) -> QueryKind {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            let kind = query_kind(&cte.query);
            if !kind.is_read_only() {
                return kind;
            }
        }
    }
    set_expr_kind(&query.body)
}

fn set_expr_kind(body: &SetExpr) -> QueryKind {
    match body {
        SetExpr::Select(_) | SetExpr::Values(_) | SetExpr::Table(_) => QueryKind::Select,
        SetExpr::Query(query) => query_kind(query),
        SetExpr::SetOperation { left, right, .. } => {
            let kind = set_expr_kind(left);
            if kind.is_read_only() {
                set_expr_kind(right)
            } else {
                kind
            }
        }
        SetExpr::Insert(_) => QueryKind::Insert,
        SetExpr::Update(_) => QueryKind::Update,
        #[allow(unreachable_patterns)]
        _ => QueryKind::Unknown,
    }
}

fn skip_trivia(mut s: &str) -> &str {
    loop {
        let trimmed = s.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(comment) = trimmed.strip_prefix("--") {
            s = comment.split_once('\n').map_or("", |(_, rest)| rest);
        } else if let Some(comment) = trimmed.strip_prefix("/*") {
            s = comment.split_once("*/").map_or("", |(_, rest)| rest);
        } else {
            return trimmed;
        }
    }
}

/// Split on semicolons that are not inside quotes or comments.
fn split_statements(query: &str) -> Vec<&str> {
    let bytes = query.as_bytes();
    let mut statements = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        // doubled quote is an escape
                        if bytes.get(i + 1) == Some(&quote) {
                            i += 1;
                        } else {
                            break;
                        }
                    }
                    i += 1;
                }
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 1;
            }
            b';' => {
                statements.push(&query[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < query.len() {
        statements.push(&query[start..]);
    }

    statements
        .into_iter()
        .filter(|s| !skip_trivia(s).is_empty())
        .collect()
}
