//! SchemaDrift engine - Core comparison logic
//!
//! This crate implements schema drift detection:
//! - Type widening rules
//! - Per-column severity classification
//! - Recursive column diff over nested struct fields
//! - Severity roll-up and result envelope
//! - JSON document adapter

pub mod widening;
pub mod classify;
pub mod column_diff;
pub mod compare;
pub mod adapter;

pub use widening::is_safe_widening;
pub use column_diff::diff_columns;
pub use compare::{compare_schemas, diff_tables};
pub use adapter::{
    compare_schemas_from_json_str, compare_schemas_from_values, table_schema_from_json_str,
    table_schema_from_value, AdapterError,
};
