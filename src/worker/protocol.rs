//! Wire types for the schema worker protocol.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Envelope
// ============================================================================

/// Request envelope sent to the worker.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: String,
    /// Method name (e.g., "metadata.list_tables").
    pub method: String,
    /// Method-specific parameters.
    pub params: serde_json::Value,
}

/// Response envelope received from the worker.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to.
    pub id: String,
    /// Whether the request succeeded.
    pub success: bool,
    /// Result data (present if success = true).
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Error information (present if success = false).
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

/// Error information in a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

// ============================================================================
// Request Parameters
// ============================================================================

/// Database connection parameters (included in all requests).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Database driver name (e.g., "postgres", "mssql").
    pub driver: String,
    /// Driver-specific connection string.
    pub connection_string: String,
}

/// Parameters for `metadata.list_tables`.
#[derive(Debug, Clone, Serialize)]
pub struct ListTablesParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    /// Schema to list tables from (worker default if absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// Parameters for `metadata.get_table` and `metadata.get_indexes`.
#[derive(Debug, Clone, Serialize)]
pub struct TableParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub schema: String,
    pub table: String,
}

// ============================================================================
// Response Types
// ============================================================================

/// Basic table information.
#[derive(Debug, Clone, Deserialize)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    /// "TABLE", "VIEW", "MATERIALIZED_VIEW".
    #[serde(rename = "type")]
    pub table_type: String,
}

/// Response from `metadata.list_tables`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListTablesResponse {
    pub tables: Vec<TableInfo>,
}

/// Column information.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Ordinal position (1-based).
    pub position: i32,
    /// Database-specific type name.
    pub data_type: String,
    pub is_nullable: bool,
    #[serde(default)]
    pub max_length: Option<i32>,
    /// Identity/auto-increment column.
    #[serde(default)]
    pub is_identity: bool,
    #[serde(default)]
    pub is_computed: bool,
}

/// Primary key information.
#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryKeyInfo {
    pub name: String,
    /// Columns in key order.
    pub columns: Vec<String>,
}

/// Foreign key information.
#[derive(Debug, Clone, Deserialize)]
pub struct ForeignKeyInfo {
    /// Constraint name.
    pub name: String,
    /// Columns in the foreign key (ordered).
    pub columns: Vec<String>,
    pub referenced_schema: String,
    pub referenced_table: String,
    /// Columns in the referenced table (ordered).
    pub referenced_columns: Vec<String>,
}

/// Detailed table information.
#[derive(Debug, Clone, Deserialize)]
pub struct TableDetailInfo {
    pub schema: String,
    pub name: String,
    #[serde(rename = "type")]
    pub table_type: String,
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub primary_key: Option<PrimaryKeyInfo>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

/// Response from `metadata.get_table`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetTableResponse {
    pub table: TableDetailInfo,
}

/// Index column information.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexColumnInfo {
    pub name: String,
    /// Position in the index (1-based).
    pub position: i32,
    /// Included (non-key) column.
    #[serde(default)]
    pub is_included: bool,
}

/// Index information.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<IndexColumnInfo>,
    pub is_unique: bool,
    /// Backs the primary key.
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_clustered: bool,
}

/// Response from `metadata.get_indexes`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetIndexesResponse {
    pub indexes: Vec<IndexInfo>,
}

// ============================================================================
// Method Names
// ============================================================================

/// Worker method names.
pub mod methods {
    pub const LIST_TABLES: &str = "metadata.list_tables";
    pub const GET_TABLE: &str = "metadata.get_table";
    pub const GET_INDEXES: &str = "metadata.get_indexes";
}
