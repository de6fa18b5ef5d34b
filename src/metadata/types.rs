//! Declared property types.
//!
//! Schema sources report column types as free-form database type names
//! (`bigint`, `nvarchar(50)`, `datetimeoffset`, ...). `DataType` normalises
//! those names into a small closed set that the generators can map onto each
//! protocol's scalar types. Names that are not recognised are preserved as
//! [`DataType::Other`] so that loading never fails on an exotic column type.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Normalised property type.
///
/// # Examples
///
/// ```ignore
/// use dynapi::metadata::DataType;
///
/// assert_eq!(DataType::parse("bigint"), DataType::Int64);
/// assert_eq!(DataType::parse("varchar(255)"), DataType::Varchar(255));
/// assert_eq!(DataType::parse("geography"), DataType::Other("geography".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean type.
    Bool,

    /// 8-bit signed integer (TINYINT in most databases).
    Int8,

    /// 16-bit signed integer (SMALLINT).
    Int16,

    /// 32-bit signed integer (INT/INTEGER).
    Int32,

    /// 64-bit signed integer (BIGINT).
    Int64,

    /// 32-bit floating point (REAL/FLOAT4).
    Float32,

    /// 64-bit floating point (DOUBLE PRECISION/FLOAT8).
    Float64,

    /// Fixed-precision decimal with precision and scale.
    Decimal(u8, u8),

    /// Variable-length string without a declared limit.
    String,

    /// Fixed-length character string.
    Char(u16),

    /// Variable-length character string with maximum length.
    Varchar(u16),

    /// Date without time.
    Date,

    /// Time without date or timezone.
    Time,

    /// Timestamp without timezone.
    Timestamp,

    /// Timestamp with timezone.
    TimestampTz,

    /// Binary data (BLOB, BYTEA, VARBINARY).
    Binary,

    /// JSON document.
    Json,

    /// UUID/GUID.
    Uuid,

    /// A type name the parser does not recognise, kept verbatim (lower-cased).
    Other(String),
}

impl DataType {
    /// Parse a database type name.
    ///
    /// Never fails: unrecognised names become [`DataType::Other`].
    pub fn parse(s: &str) -> Self {
        Self::parse_known(s).unwrap_or_else(|| DataType::Other(s.trim().to_lowercase()))
    }

    /// Parse a database type name, returning `None` for unrecognised names.
    pub fn parse_known(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();

        if let Some(inner) = extract_parens(&s, "decimal").or_else(|| extract_parens(&s, "numeric"))
        {
            return parse_decimal_params(&inner);
        }

        if let Some(inner) = extract_parens(&s, "varchar")
            .or_else(|| extract_parens(&s, "character varying"))
            .or_else(|| extract_parens(&s, "nvarchar"))
        {
            return parse_length_param(&inner).map(DataType::Varchar);
        }

        if let Some(inner) = extract_parens(&s, "char")
            .or_else(|| extract_parens(&s, "character"))
            .or_else(|| extract_parens(&s, "nchar"))
        {
            return parse_length_param(&inner).map(DataType::Char);
        }

        // varbinary(n) / binary(n) carry a length we do not need
        if extract_parens(&s, "varbinary").is_some() || extract_parens(&s, "binary").is_some() {
            return Some(DataType::Binary);
        }

        match s.as_str() {
            "bool" | "boolean" | "bit" => Some(DataType::Bool),

            "tinyint" => Some(DataType::Int8),
            "smallint" | "int16" | "int2" => Some(DataType::Int16),
            "int" | "integer" | "int32" | "int4" | "serial" => Some(DataType::Int32),
            "bigint" | "int64" | "int8" | "bigserial" => Some(DataType::Int64),

            "real" | "float4" | "float32" => Some(DataType::Float32),
            "double" | "float8" | "float64" | "double precision" | "float" => {
                Some(DataType::Float64)
            }

            "decimal" | "numeric" | "number" | "money" => Some(DataType::Decimal(18, 2)),

            "text" | "string" | "clob" | "ntext" => Some(DataType::String),
            "varchar" | "nvarchar" | "character varying" => Some(DataType::String),

            "date" => Some(DataType::Date),
            "time" => Some(DataType::Time),
            "timestamp" | "datetime" | "datetime2" | "smalldatetime" => Some(DataType::Timestamp),
            "timestamptz" | "timestamp with time zone" | "datetimeoffset" => {
                Some(DataType::TimestampTz)
            }

            "binary" | "blob" | "bytea" | "varbinary" | "image" => Some(DataType::Binary),

            "json" | "jsonb" => Some(DataType::Json),

            "uuid" | "guid" | "uniqueidentifier" => Some(DataType::Uuid),

            _ => None,
        }
    }

    /// Returns true if this is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    /// Returns true if this is a floating point type.
    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Returns true if this is a string/text type.
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            DataType::String | DataType::Char(_) | DataType::Varchar(_)
        )
    }

    /// Returns true if this is a temporal (date/time) type.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            DataType::Date | DataType::Time | DataType::Timestamp | DataType::TimestampTz
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "boolean"),
            DataType::Int8 => write!(f, "tinyint"),
            DataType::Int16 => write!(f, "smallint"),
            DataType::Int32 => write!(f, "integer"),
            DataType::Int64 => write!(f, "bigint"),
            DataType::Float32 => write!(f, "real"),
            DataType::Float64 => write!(f, "double precision"),
            DataType::Decimal(p, s) => write!(f, "decimal({},{})", p, s),
            DataType::String => write!(f, "text"),
            DataType::Char(n) => write!(f, "char({})", n),
            DataType::Varchar(n) => write!(f, "varchar({})", n),
            DataType::Date => write!(f, "date"),
            DataType::Time => write!(f, "time"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::TimestampTz => write!(f, "timestamptz"),
            DataType::Binary => write!(f, "binary"),
            DataType::Json => write!(f, "json"),
            DataType::Uuid => write!(f, "uuid"),
            DataType::Other(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(DataType::parse(&name))
    }
}

/// Extract content inside parentheses for a given type prefix.
/// e.g., extract_parens("decimal(10,2)", "decimal") returns Some("10,2")
fn extract_parens(s: &str, prefix: &str) -> Option<String> {
    let s = s.trim();
    let rest = s.strip_prefix(prefix)?.trim();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.to_string())
}

/// Parse decimal parameters "precision,scale" or "precision, scale".
fn parse_decimal_params(inner: &str) -> Option<DataType> {
    let parts: Vec<&str> = inner.split(',').map(|s| s.trim()).collect();
    match parts.as_slice() {
        [precision] => Some(DataType::Decimal(precision.parse().ok()?, 0)),
        [precision, scale] => Some(DataType::Decimal(precision.parse().ok()?, scale.parse().ok()?)),
        _ => None,
    }
}

/// Parse a single length parameter.
fn parse_length_param(inner: &str) -> Option<u16> {
    let inner = inner.trim();
    // T-SQL spells unbounded lengths as "max"
    if inner.eq_ignore_ascii_case("max") {
        return Some(u16::MAX);
    }
    inner.parse().ok()
}
