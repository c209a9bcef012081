//! Schema comparison entry point
//!
//! Runs the column diff from the table roots, rolls the changes up into a
//! `SchemaDiff` and wraps it in a `ToolResult`. Failures never escape this
//! boundary; they come back as a failed envelope.

use schemadrift_core::{SchemaDiff, TableSchema, ToolResult};
use std::panic::{self, AssertUnwindSafe};

use crate::column_diff::diff_columns;

/// Compute the diff between a baseline and an observed schema
///
/// The table name and versions come from the baseline and observed
/// snapshots respectively.
pub fn diff_tables(baseline: &TableSchema, observed: &TableSchema) -> SchemaDiff {
    let changes = diff_columns(&baseline.columns, &observed.columns, "");

    SchemaDiff::from_changes(
        baseline.table_name.clone(),
        baseline.captured_at.to_rfc3339(),
        observed.captured_at.to_rfc3339(),
        changes,
    )
}

/// Compare two schemas and return the result envelope
///
/// The hint on success depends on the overall severity.
pub fn compare_schemas(baseline: &TableSchema, observed: &TableSchema) -> ToolResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| diff_tables(baseline, observed)));

    match outcome {
        Ok(diff) => {
            tracing::debug!(
                table = %diff.table_name,
                changes = diff.changes.len(),
                overall = %diff.overall_severity,
                "schema comparison finished"
            );
            ToolResult::ok(diff)
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            tracing::error!(table = %baseline.table_name, %reason, "schema comparison panicked");
            ToolResult::failed(format!("Schema comparison failed: {}", reason))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
