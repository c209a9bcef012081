//! Schema types and normalized type system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Normalized column type
///
/// Producers map vendor-specific types onto this closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Bigint,
    Float,
    /// Fixed-point, refined by precision and scale
    Decimal,
    /// Bounded string, refined by max_length
    Varchar,
    Text,
    Boolean,
    Date,
    Timestamp,
    Json,
    Array,
    /// Nested record, owns an ordered list of fields
    Struct,
    /// Type could not be determined by the producer
    Unknown,
}

impl ColumnType {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Bigint => "bigint",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Varchar => "varchar",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Timestamp => "timestamp",
            Self::Json => "json",
            Self::Array => "array",
            Self::Struct => "struct",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a type name, mapping anything unrecognized to `Unknown`
    ///
    /// Type inference is best-effort, so an odd type name never fails a schema.
    pub fn from_name_lenient(name: &str) -> Self {
        name.parse().unwrap_or(Self::Unknown)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a type name is not part of the normalized set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized column type: {0}")]
pub struct UnknownColumnType(pub String);

impl FromStr for ColumnType {
    type Err = UnknownColumnType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "integer" => Self::Integer,
            "bigint" => Self::Bigint,
            "float" => Self::Float,
            "decimal" => Self::Decimal,
            "varchar" => Self::Varchar,
            "text" => Self::Text,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "timestamp" => Self::Timestamp,
            "json" => Self::Json,
            "array" => Self::Array,
            "struct" => Self::Struct,
            "unknown" => Self::Unknown,
            _ => return Err(UnknownColumnType(s.to_string())),
        };
        Ok(ty)
    }
}

/// A column, or a field of a struct column
///
/// `fields` is `Some` exactly when `col_type` is `Struct`; an empty struct
/// carries `Some(vec![])`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name, unique within its enclosing list
    pub name: String,

    /// Normalized type
    pub col_type: ColumnType,

    /// Whether NULL values are allowed
    pub nullable: bool,

    /// Maximum length (varchar); `None` means unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    /// Total digits (decimal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    /// Digits after the point (decimal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,

    /// Default value expression, as reported by the producer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Nested fields of a struct column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<ColumnSchema>>,
}

impl ColumnSchema {
    /// Create a nullable column with no refinements
    ///
    /// A `Struct` column starts with an empty field list.
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            col_type,
            nullable: true,
            max_length: None,
            precision: None,
            scale: None,
            default_value: None,
            description: None,
            fields: (col_type == ColumnType::Struct).then(Vec::new),
        }
    }

    /// Create a struct column owning the given fields
    pub fn structure(name: impl Into<String>, fields: Vec<ColumnSchema>) -> Self {
        let mut column = Self::new(name, ColumnType::Struct);
        column.fields = Some(fields);
        column
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check if this is a struct column
    pub fn is_struct(&self) -> bool {
        self.col_type == ColumnType::Struct
    }

    /// Nested fields, empty for non-struct columns
    pub fn nested_fields(&self) -> &[ColumnSchema] {
        self.fields.as_deref().unwrap_or(&[])
    }

    /// Structural equality used for drift comparison
    ///
    /// Compares type, nullability, refinements and nested fields. Name,
    /// default value and description are ignored; they have their own
    /// change rules.
    pub fn shape_eq(&self, other: &ColumnSchema) -> bool {
        self.col_type == other.col_type
            && self.nullable == other.nullable
            && self.max_length == other.max_length
            && self.precision == other.precision
            && self.scale == other.scale
            && self.nested_fields().len() == other.nested_fields().len()
            && self
                .nested_fields()
                .iter()
                .zip(other.nested_fields())
                .all(|(a, b)| a.shape_eq(b))
    }
}

/// A snapshot of a table's structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,

    /// Ordered list of columns
    pub columns: Vec<ColumnSchema>,

    /// Partition key column names (informational)
    #[serde(default)]
    pub partition_keys: Vec<String>,

    /// Clustering key column names (informational)
    #[serde(default)]
    pub clustering_keys: Vec<String>,

    /// Producer tag, e.g. "sqlite" or "json_file"
    #[serde(default = "default_source")]
    pub source: String,

    /// When this snapshot was taken
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

fn default_source() -> String {
    "unknown".to_string()
}

impl TableSchema {
    /// Create a snapshot captured now
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            partition_keys: Vec::new(),
            clustering_keys: Vec::new(),
            source: default_source(),
            captured_at: Utc::now(),
        }
    }

    pub fn with_partition_keys(mut self, keys: Vec<String>) -> Self {
        self.partition_keys = keys;
        self
    }

    pub fn with_clustering_keys(mut self, keys: Vec<String>) -> Self {
        self.clustering_keys = keys;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// Find a top-level column by name
    pub fn find_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get top-level column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Index top-level columns by name
    pub fn column_map(&self) -> HashMap<&str, &ColumnSchema> {
        self.columns.iter().map(|c| (c.name.as_str(), c)).collect()
    }

    /// Serialize to a pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_type_display_and_parse() {
        assert_eq!(ColumnType::Bigint.to_string(), "bigint");
        assert_eq!("VARCHAR".parse::<ColumnType>(), Ok(ColumnType::Varchar));
        assert!("nvarchar2".parse::<ColumnType>().is_err());
        assert_eq!(ColumnType::from_name_lenient("geography"), ColumnType::Unknown);
    }

    #[test]
    fn struct_columns_always_own_a_field_list() {
        let empty = ColumnSchema::new("payload", ColumnType::Struct);
        assert_eq!(empty.fields, Some(vec![]));

        let scalar = ColumnSchema::new("id", ColumnType::Integer);
        assert_eq!(scalar.fields, None);
        assert!(scalar.nested_fields().is_empty());
    }

    #[test]
    fn shape_eq_ignores_name_default_and_description() {
        let a = ColumnSchema::new("a", ColumnType::Varchar)
            .with_max_length(20)
            .with_default("'x'")
            .with_description("first");
        let b = ColumnSchema::new("b", ColumnType::Varchar).with_max_length(20);

        assert!(a.shape_eq(&b));
        assert!(!a.shape_eq(&b.clone().with_max_length(30)));
        assert!(!a.shape_eq(&b.with_nullable(false)));
    }

    #[test]
    fn shape_eq_recurses_into_fields() {
        let a = ColumnSchema::structure(
            "address",
            vec![ColumnSchema::new("zip", ColumnType::Varchar)],
        );
        let b = ColumnSchema::structure(
            "address",
            vec![ColumnSchema::new("zip", ColumnType::Integer)],
        );

        assert!(a.shape_eq(&a.clone()));
        assert!(!a.shape_eq(&b));
    }

    #[test]
    fn table_operations() {
        let table = TableSchema::new(
            "users",
            vec![
                ColumnSchema::new("id", ColumnType::Integer),
                ColumnSchema::new("name", ColumnType::Text),
            ],
        )
        .with_source("sqlite");

        assert_eq!(table.column_names(), vec!["id", "name"]);
        assert!(table.find_column("id").is_some());
        assert!(table.find_column("nonexistent").is_none());
        assert_eq!(table.column_map().len(), 2);
        assert_eq!(table.source, "sqlite");
    }

    #[test]
    fn column_serialization_skips_absent_refinements() {
        let column = ColumnSchema::new("id", ColumnType::Integer).with_nullable(false);
        let json = serde_json::to_value(&column).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "name": "id", "col_type": "integer", "nullable": false })
        );
    }
}
