//! Severity classification rules for single-column changes
//!
//! Each rule is a pure function of the column snapshots involved and
//! returns the change kind, its severity and a justification.

use schemadrift_core::{ChangeSeverity, ChangeType, ColumnSchema, ColumnType};
use crate::widening::is_safe_widening;

/// Outcome of a classification rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub change_type: ChangeType,
    pub severity: ChangeSeverity,
    pub reasoning: String,
}

impl Classification {
    fn new(change_type: ChangeType, severity: ChangeSeverity, reasoning: impl Into<String>) -> Self {
        Self {
            change_type,
            severity,
            reasoning: reasoning.into(),
        }
    }
}

/// Classify a column present only in the observed schema
///
/// Breaking iff NOT NULL without a default: existing rows cannot satisfy it.
pub fn classify_added(column: &ColumnSchema, qualified: &str) -> Classification {
    let breaking = !column.nullable && column.default_value.is_none();

    let (severity, detail) = if breaking {
        (
            ChangeSeverity::Breaking,
            "NOT NULL with no default; existing rows cannot satisfy the constraint and inserts that omit it will fail.",
        )
    } else {
        (
            ChangeSeverity::Safe,
            "Nullable or has a default; existing queries are unaffected.",
        )
    };

    Classification::new(
        ChangeType::ColumnAdded,
        severity,
        format!("Column '{}' ({}) was added. {}", qualified, column.col_type, detail),
    )
}

/// Classify a column present only in the baseline schema (always breaking)
pub fn classify_removed(column: &ColumnSchema, qualified: &str) -> Classification {
    Classification::new(
        ChangeType::ColumnRemoved,
        ChangeSeverity::Breaking,
        format!(
            "Column '{}' ({}) was removed. Consumers reading it by name or relying on the full row shape will fail.",
            qualified, column.col_type
        ),
    )
}

/// Classify a change of type or of a type refinement (length, precision, scale)
pub fn classify_type_change(old: &ColumnSchema, new: &ColumnSchema) -> Classification {
    let (old_t, new_t) = (old.col_type, new.col_type);

    if old_t == new_t {
        let refined = match old_t {
            ColumnType::Varchar => classify_length_change(old.max_length, new.max_length),
            ColumnType::Decimal => Some(classify_precision_change(old.precision, new.precision)),
            _ => None,
        };

        return refined.unwrap_or_else(|| {
            Classification::new(
                ChangeType::TypeChanged,
                ChangeSeverity::Safe,
                format!(
                    "Type {} unchanged; only attribute metadata changed (max_length {:?} -> {:?}, precision {:?} -> {:?}, scale {:?} -> {:?}).",
                    old_t, old.max_length, new.max_length, old.precision, new.precision, old.scale, new.scale
                ),
            )
        });
    }

    if is_safe_widening(old_t, new_t) {
        return Classification::new(
            ChangeType::TypeWidened,
            ChangeSeverity::Safe,
            format!("{} -> {} is a safe widening; existing values remain representable.", old_t, new_t),
        );
    }

    Classification::new(
        ChangeType::TypeChanged,
        ChangeSeverity::Breaking,
        format!(
            "{} -> {} is a potentially breaking type change. Consumers expecting {} will fail or read incorrect values.",
            old_t, new_t, old_t
        ),
    )
}

/// Varchar length rule; a missing length compares as 0
///
/// Any move to an unbounded length, or from an unbounded one, is a widening.
fn classify_length_change(old: Option<u32>, new: Option<u32>) -> Option<Classification> {
    let (old_len, new_len) = (old.unwrap_or(0), new.unwrap_or(0));

    if new_len > old_len || (new_len == 0 && old_len != 0) {
        Some(Classification::new(
            ChangeType::TypeWidened,
            ChangeSeverity::Safe,
            format!(
                "VARCHAR length went from {} to {}; safe widening.",
                describe_length(old),
                describe_length(new)
            ),
        ))
    } else if new_len < old_len {
        Some(Classification::new(
            ChangeType::TypeChanged,
            ChangeSeverity::Breaking,
            format!(
                "VARCHAR length decreased from {} to {}; existing values may be truncated or rejected.",
                old_len, new_len
            ),
        ))
    } else {
        None
    }
}

fn describe_length(length: Option<u32>) -> String {
    match length {
        Some(n) => n.to_string(),
        None => "unbounded".to_string(),
    }
}

/// Decimal precision rule; a missing precision compares as 0
fn classify_precision_change(old: Option<u32>, new: Option<u32>) -> Classification {
    let (old_prec, new_prec) = (old.unwrap_or(0), new.unwrap_or(0));

    if new_prec >= old_prec {
        Classification::new(
            ChangeType::TypeWidened,
            ChangeSeverity::Safe,
            format!("DECIMAL precision went from {} to {}; no digits are lost.", old_prec, new_prec),
        )
    } else {
        Classification::new(
            ChangeType::TypeChanged,
            ChangeSeverity::Warning,
            format!(
                "DECIMAL precision decreased from {} to {}; existing values may lose precision.",
                old_prec, new_prec
            ),
        )
    }
}

/// Classify a nullability flip
pub fn classify_nullability_change(old: &ColumnSchema, new: &ColumnSchema) -> Classification {
    if !old.nullable && new.nullable {
        Classification::new(
            ChangeType::NullabilityRelaxed,
            ChangeSeverity::Safe,
            "Column changed from NOT NULL to NULL; the constraint was relaxed.",
        )
    } else {
        Classification::new(
            ChangeType::NullabilityTightened,
            ChangeSeverity::Breaking,
            "Column changed from NULL to NOT NULL; existing NULL values violate the new constraint.",
        )
    }
}

/// Classify a default-only change (always a warning)
pub fn classify_default_change(old: &ColumnSchema, new: &ColumnSchema) -> Classification {
    Classification::new(
        ChangeType::DefaultChanged,
        ChangeSeverity::Warning,
        format!(
            "Default value changed from {} to {}. Reads are unaffected, but future inserts get a different value.",
            describe_default(&old.default_value),
            describe_default(&new.default_value)
        ),
    )
}

fn describe_default(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("'{}'", v),
        None => "none".to_string(),
    }
}
