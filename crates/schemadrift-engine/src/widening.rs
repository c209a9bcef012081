//! Type widening rules
//!
//! Lists which cross-type transitions are non-breaking. Anything not listed
//! is treated as breaking.

use schemadrift_core::ColumnType;

/// Look up the explicit rule for a `from -> to` transition
///
/// Returns `Some(true)` for a listed safe widening, `Some(false)` for a
/// listed dangerous change and `None` when the pair is not listed.
pub fn widening_rule(from: ColumnType, to: ColumnType) -> Option<bool> {
    use ColumnType::*;

    match (from, to) {
        // Numeric widenings
        (Integer, Bigint) => Some(true),
        (Integer, Float) => Some(true),
        (Integer, Decimal) => Some(true),
        (Float, Decimal) => Some(true),

        // String widenings
        (Varchar, Text) => Some(true),

        // Consumers expect the old representation
        (Integer, Varchar) => Some(false),
        (Float, Varchar) => Some(false),
        (Decimal, Varchar) => Some(false),
        (Timestamp, Varchar) => Some(false),
        (Boolean, Integer) => Some(false),
        (Json, Varchar) => Some(false),
        (Varchar, Integer) => Some(false),

        _ => None,
    }
}

/// Check if `from -> to` is a listed safe widening
///
/// Unlisted pairs are never safe.
pub fn is_safe_widening(from: ColumnType, to: ColumnType) -> bool {
    widening_rule(from, to).unwrap_or(false)
}
