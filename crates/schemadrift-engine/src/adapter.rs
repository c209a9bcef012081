//! JSON document adapter
//!
//! Turns loosely-typed schema documents into `TableSchema` values before
//! handing them to the comparison engine. Accepted shape:
//!
//! ```json
//! { "table_name": "orders",
//!   "columns": [ { "name": "id", "col_type": "integer", "nullable": false },
//!                { "name": "meta", "type": "struct", "fields": [ ... ] } ],
//!   "partition_keys": ["id"], "source": "json_file" }
//! ```
//!
//! `type` is accepted as an alias of `col_type`, and unrecognized type
//! names become `unknown` instead of failing.

use chrono::{DateTime, NaiveDateTime, Utc};
use schemadrift_core::{ColumnSchema, ColumnType, TableSchema, ToolResult};
use serde::Deserialize;
use std::collections::HashSet;

use crate::compare::compare_schemas;

/// Source tag used when a document does not name its producer
pub const DEFAULT_SOURCE: &str = "json_payload";

/// Validation failures of a schema document
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Document shape is wrong (missing `table_name`, column without `name`, ...)
    #[error("{0}")]
    Malformed(#[from] serde_json::Error),

    /// Two columns share a name within one list
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
}

#[derive(Debug, Deserialize)]
struct RawTable {
    table_name: String,
    #[serde(default)]
    columns: Vec<RawColumn>,
    #[serde(default)]
    partition_keys: Vec<String>,
    #[serde(default)]
    clustering_keys: Vec<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    captured_at: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    name: String,
    #[serde(default)]
    col_type: Option<String>,
    #[serde(default, rename = "type")]
    type_alias: Option<String>,
    #[serde(default)]
    nullable: Option<bool>,
    #[serde(default)]
    max_length: Option<u32>,
    #[serde(default)]
    precision: Option<u32>,
    #[serde(default)]
    scale: Option<u32>,
    #[serde(default)]
    default_value: Option<serde_json::Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    fields: Option<Vec<RawColumn>>,
}

impl RawTable {
    fn into_table(self) -> Result<TableSchema, AdapterError> {
        let columns = convert_columns(self.columns, "")?;

        Ok(TableSchema::new(self.table_name, columns)
            .with_partition_keys(self.partition_keys)
            .with_clustering_keys(self.clustering_keys)
            .with_source(self.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()))
            .with_captured_at(parse_captured_at(self.captured_at.as_ref())))
    }
}

fn convert_columns(raw: Vec<RawColumn>, prefix: &str) -> Result<Vec<ColumnSchema>, AdapterError> {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(raw.len());

    for column in raw {
        if !seen.insert(column.name.clone()) {
            return Err(AdapterError::DuplicateColumn(format!("{}{}", prefix, column.name)));
        }
        columns.push(convert_column(column, prefix)?);
    }

    Ok(columns)
}

fn convert_column(raw: RawColumn, prefix: &str) -> Result<ColumnSchema, AdapterError> {
    let col_type = raw
        .col_type
        .or(raw.type_alias)
        .map(|name| ColumnType::from_name_lenient(&name))
        .unwrap_or(ColumnType::Unknown);

    // Only struct columns own fields; a struct without fields gets an empty list.
    let fields = if col_type == ColumnType::Struct {
        let nested_prefix = format!("{}{}.", prefix, raw.name);
        Some(convert_columns(raw.fields.unwrap_or_default(), &nested_prefix)?)
    } else {
        None
    };

    Ok(ColumnSchema {
        name: raw.name,
        col_type,
        nullable: raw.nullable.unwrap_or(true),
        max_length: raw.max_length,
        precision: raw.precision,
        scale: raw.scale,
        default_value: raw.default_value.and_then(default_to_string),
        description: raw.description,
        fields,
    })
}

/// Read a capture timestamp, RFC 3339 first, then a naive ISO timestamp as UTC
///
/// Capture time is informational; an unreadable value is replaced by the
/// current time instead of rejecting the document.
fn parse_captured_at(value: Option<&serde_json::Value>) -> DateTime<Utc> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Utc::now();
    };

    let parsed = value.as_str().and_then(|text| {
        DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                text.parse::<NaiveDateTime>()
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    });

    parsed.unwrap_or_else(|| {
        tracing::warn!(captured_at = %value, "unreadable captured_at, using current time");
        Utc::now()
    })
}

/// Defaults are kept as text; non-string scalars keep their JSON spelling
fn default_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Build a `TableSchema` from a parsed JSON document
pub fn table_schema_from_value(value: &serde_json::Value) -> Result<TableSchema, AdapterError> {
    RawTable::deserialize(value)?.into_table()
}

/// Build a `TableSchema` from JSON text
pub fn table_schema_from_json_str(json: &str) -> Result<TableSchema, AdapterError> {
    serde_json::from_str::<RawTable>(json)?.into_table()
}

/// Validate two documents and compare them
///
/// A document that fails validation yields a failed envelope and the
/// engine is not run.
pub fn compare_schemas_from_values(old: &serde_json::Value, new: &serde_json::Value) -> ToolResult {
    compare_validated(table_schema_from_value(old), table_schema_from_value(new))
}

/// Same as [`compare_schemas_from_values`], from JSON text
pub fn compare_schemas_from_json_str(old: &str, new: &str) -> ToolResult {
    compare_validated(table_schema_from_json_str(old), table_schema_from_json_str(new))
}

fn compare_validated(
    old: Result<TableSchema, AdapterError>,
    new: Result<TableSchema, AdapterError>,
) -> ToolResult {
    let old = match old {
        Ok(schema) => schema,
        Err(e) => {
            tracing::warn!(error = %e, "baseline schema document rejected");
            return ToolResult::failed(format!("Old schema invalid: {}", e));
        }
    };
    let new = match new {
        Ok(schema) => schema,
        Err(e) => {
            tracing::warn!(error = %e, "observed schema document rejected");
            return ToolResult::failed(format!("New schema invalid: {}", e));
        }
    };

    compare_schemas(&old, &new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_documented_shape() {
        let table = table_schema_from_value(&json!({
            "table_name": "orders",
            "columns": [
                { "name": "id", "col_type": "integer", "nullable": false },
                { "name": "code", "type": "VARCHAR", "max_length": 12 },
                { "name": "amount", "col_type": "decimal", "precision": 10, "scale": 2 }
            ],
            "partition_keys": ["id"],
            "source": "json_file"
        }))
        .unwrap();

        assert_eq!(table.table_name, "orders");
        assert_eq!(table.source, "json_file");
        assert_eq!(table.partition_keys, vec!["id"]);
        assert_eq!(table.columns[0].col_type, ColumnType::Integer);
        assert!(!table.columns[0].nullable);
        assert_eq!(table.columns[1].col_type, ColumnType::Varchar);
        assert_eq!(table.columns[1].max_length, Some(12));
        assert!(table.columns[1].nullable);
        assert_eq!(table.columns[2].scale, Some(2));
    }

    #[test]
    fn col_type_wins_over_alias() {
        let table = table_schema_from_value(&json!({
            "table_name": "t",
            "columns": [{ "name": "x", "col_type": "bigint", "type": "text" }]
        }))
        .unwrap();

        assert_eq!(table.columns[0].col_type, ColumnType::Bigint);
    }

    #[test]
    fn unknown_or_missing_type_becomes_unknown() {
        let table = table_schema_from_value(&json!({
            "table_name": "t",
            "columns": [{ "name": "geo", "type": "geography" }, { "name": "blob" }]
        }))
        .unwrap();

        assert_eq!(table.columns[0].col_type, ColumnType::Unknown);
        assert_eq!(table.columns[1].col_type, ColumnType::Unknown);
    }

    #[test]
    fn nested_struct_fields_are_rebuilt() {
        let table = table_schema_from_value(&json!({
            "table_name": "events",
            "columns": [
                { "name": "user", "type": "struct", "fields": [
                    { "name": "address", "type": "struct", "fields": [
                        { "name": "zip", "type": "varchar" }
                    ]}
                ]},
                { "name": "empty", "type": "struct" },
                { "name": "flat", "type": "text", "fields": [{ "name": "ignored", "type": "text" }] }
            ]
        }))
        .unwrap();

        let address = &table.columns[0].nested_fields()[0];
        assert_eq!(address.name, "address");
        assert_eq!(address.nested_fields()[0].name, "zip");
        assert_eq!(table.columns[1].fields, Some(vec![]));
        assert_eq!(table.columns[2].fields, None);
    }

    #[test]
    fn non_string_defaults_are_stringified() {
        let table = table_schema_from_value(&json!({
            "table_name": "t",
            "columns": [
                { "name": "n", "type": "integer", "default_value": 0 },
                { "name": "s", "type": "text", "default_value": "abc" },
                { "name": "z", "type": "text", "default_value": null }
            ]
        }))
        .unwrap();

        assert_eq!(table.columns[0].default_value.as_deref(), Some("0"));
        assert_eq!(table.columns[1].default_value.as_deref(), Some("abc"));
        assert_eq!(table.columns[2].default_value, None);
    }

    #[test]
    fn missing_table_name_is_rejected() {
        let err = table_schema_from_value(&json!({ "columns": [] })).unwrap_err();
        assert!(err.to_string().contains("table_name"));
    }

    #[test]
    fn column_without_name_is_rejected() {
        let err = table_schema_from_value(&json!({
            "table_name": "t",
            "columns": [{ "type": "integer" }]
        }))
        .unwrap_err();
        assert!(matches!(err, AdapterError::Malformed(_)));
    }

    #[test]
    fn duplicate_nested_name_is_rejected() {
        let err = table_schema_from_value(&json!({
            "table_name": "t",
            "columns": [{ "name": "s", "type": "struct", "fields": [
                { "name": "a", "type": "text" }, { "name": "a", "type": "integer" }
            ]}]
        }))
        .unwrap_err();

        assert_eq!(err.to_string(), "duplicate column name 's.a'");
    }

    #[test]
    fn captured_at_is_honoured_when_present() {
        let table = table_schema_from_json_str(
            r#"{ "table_name": "t", "captured_at": "2024-05-01T12:00:00Z" }"#,
        )
        .unwrap();

        assert_eq!(table.captured_at.to_rfc3339(), "2024-05-01T12:00:00+00:00");
        assert_eq!(table.source, DEFAULT_SOURCE);
    }

    #[test]
    fn naive_captured_at_is_read_as_utc() {
        let table = table_schema_from_value(&json!({
            "table_name": "t",
            "captured_at": "2024-05-01T12:00:00.123456"
        }))
        .unwrap();

        assert_eq!(table.captured_at.to_rfc3339(), "2024-05-01T12:00:00.123456+00:00");
    }

    #[test]
    fn unreadable_captured_at_falls_back_to_now() {
        let before = Utc::now();
        let garbage = table_schema_from_value(&json!({ "table_name": "t", "captured_at": "yesterday" }))
            .unwrap();
        let numeric = table_schema_from_value(&json!({ "table_name": "t", "captured_at": 17 }))
            .unwrap();

        assert!(garbage.captured_at >= before);
        assert!(numeric.captured_at >= before);
    }

    #[test]
    fn naive_captured_at_does_not_block_comparison() {
        let doc = json!({
            "table_name": "t",
            "captured_at": "2024-05-01T12:00:00.123456",
            "columns": [{ "name": "id", "type": "integer" }]
        });

        let result = compare_schemas_from_values(&doc, &doc);

        assert!(result.success, "{:?}", result.error);
        assert_eq!(
            result.diff().unwrap().old_schema_version,
            "2024-05-01T12:00:00.123456+00:00"
        );
    }

    #[test]
    fn invalid_document_short_circuits() {
        let result = compare_schemas_from_values(
            &json!({ "table_name": "t", "columns": [] }),
            &json!({ "columns": [] }),
        );

        assert!(!result.success);
        assert!(result.data.is_none());
        assert!(result.error.unwrap().starts_with("New schema invalid:"));
    }
}
