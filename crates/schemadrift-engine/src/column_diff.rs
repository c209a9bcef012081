//! Recursive column diffing
//!
//! Walks a baseline and an observed column list, classifies every
//! difference and descends into struct columns present on both sides.
//! Nested changes are reported under dot-qualified names such as
//! `user.address.zip`.

use schemadrift_core::{ChangeSeverity, ChangeType, ColumnChange, ColumnSchema};
use serde_json::json;
use std::collections::HashMap;

use crate::classify::{
    classify_added, classify_default_change, classify_nullability_change, classify_removed,
    classify_type_change, Classification,
};

/// Pseudo column name used for the reorder entry of a column list
pub const REORDER_COLUMN_NAME: &str = "<multiple>";

/// Compare two ordered column lists
///
/// `prefix` is prepended to every reported column name; it is empty at the
/// table root and `"parent."` inside a struct. Output order is: removals,
/// additions, same-name modifications (baseline order), then at most one
/// reorder entry.
pub fn diff_columns(old: &[ColumnSchema], new: &[ColumnSchema], prefix: &str) -> Vec<ColumnChange> {
    let old_by_name: HashMap<&str, &ColumnSchema> =
        old.iter().map(|c| (c.name.as_str(), c)).collect();
    let new_by_name: HashMap<&str, &ColumnSchema> =
        new.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut changes = Vec::new();

    // Removed: in baseline, not observed
    for old_col in old.iter().filter(|c| !new_by_name.contains_key(c.name.as_str())) {
        let qualified = format!("{}{}", prefix, old_col.name);
        let classification = classify_removed(old_col, &qualified);
        changes.push(
            into_change(classification, qualified)
                .with_values(serde_json::to_value(old_col).ok(), None),
        );
    }

    // Added: observed, not in baseline
    for new_col in new.iter().filter(|c| !old_by_name.contains_key(c.name.as_str())) {
        let qualified = format!("{}{}", prefix, new_col.name);
        let classification = classify_added(new_col, &qualified);
        changes.push(
            into_change(classification, qualified)
                .with_values(None, serde_json::to_value(new_col).ok()),
        );
    }

    // Modified: present on both sides, in baseline order
    for old_col in old {
        let Some(new_col) = new_by_name.get(old_col.name.as_str()) else {
            continue;
        };
        let qualified = format!("{}{}", prefix, old_col.name);

        if old_col.is_struct() && new_col.is_struct() {
            tracing::trace!(column = %qualified, "descending into struct column");
            let nested_prefix = format!("{}.", qualified);
            changes.extend(diff_columns(
                old_col.nested_fields(),
                new_col.nested_fields(),
                &nested_prefix,
            ));
            continue;
        }

        if let Some(change) = diff_same_name(old_col, new_col, qualified) {
            changes.push(change);
        }
    }

    if let Some(change) = detect_reorder(old, new, &old_by_name, &new_by_name, prefix) {
        changes.push(change);
    }

    changes
}

/// At most one change for a column present on both sides
///
/// Checks run in priority order: type/refinement, then nullability, then
/// default. The first difference found is the only one reported.
fn diff_same_name(old: &ColumnSchema, new: &ColumnSchema, qualified: String) -> Option<ColumnChange> {
    if old.shape_eq(new) {
        return diff_default(old, new, qualified);
    }

    let type_differs = old.col_type != new.col_type
        || old.max_length != new.max_length
        || old.precision != new.precision
        || old.scale != new.scale;

    if type_differs {
        let classification = classify_type_change(old, new);
        return Some(into_change(classification, qualified).with_values(
            Some(type_snapshot(old)),
            Some(type_snapshot(new)),
        ));
    }

    if old.nullable != new.nullable {
        let classification = classify_nullability_change(old, new);
        return Some(into_change(classification, qualified).with_values(
            Some(json!({ "nullable": old.nullable })),
            Some(json!({ "nullable": new.nullable })),
        ));
    }

    diff_default(old, new, qualified)
}

/// Default-only difference between two columns of the same shape
fn diff_default(old: &ColumnSchema, new: &ColumnSchema, qualified: String) -> Option<ColumnChange> {
    if old.default_value == new.default_value {
        return None;
    }

    let classification = classify_default_change(old, new);
    Some(into_change(classification, qualified).with_values(
        Some(json!({ "default_value": old.default_value })),
        Some(json!({ "default_value": new.default_value })),
    ))
}

/// Compare the relative order of names present on both sides
fn detect_reorder(
    old: &[ColumnSchema],
    new: &[ColumnSchema],
    old_by_name: &HashMap<&str, &ColumnSchema>,
    new_by_name: &HashMap<&str, &ColumnSchema>,
    prefix: &str,
) -> Option<ColumnChange> {
    let old_order: Vec<&str> = old
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| new_by_name.contains_key(name))
        .collect();
    let new_order: Vec<&str> = new
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| old_by_name.contains_key(name))
        .collect();

    if old_order == new_order {
        return None;
    }

    Some(
        ColumnChange::new(
            ChangeType::ColumnReordered,
            format!("{}{}", prefix, REORDER_COLUMN_NAME),
            ChangeSeverity::Warning,
            "Column order changed. Named column access is unaffected, but positional access \
             (SELECT *, CSV-style exports, index-based readers) may silently read the wrong values.",
        )
        .with_values(
            Some(json!({ "order": old_order })),
            Some(json!({ "order": new_order })),
        ),
    )
}

fn type_snapshot(column: &ColumnSchema) -> serde_json::Value {
    json!({
        "col_type": column.col_type,
        "max_length": column.max_length,
        "precision": column.precision,
        "scale": column.scale,
    })
}

fn into_change(classification: Classification, qualified: String) -> ColumnChange {
    ColumnChange::new(
        classification.change_type,
        qualified,
        classification.severity,
        classification.reasoning,
    )
}
