//! Schema diff value (stable v1)
//!
//! This shape is consumed by downstream automation.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::change::{ChangeSeverity, ColumnChange};

/// Itemized, severity-ranked drift between two snapshots of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// Table being compared (taken from the baseline)
    pub table_name: String,

    /// Capture time of the baseline (RFC 3339)
    pub old_schema_version: String,

    /// Capture time of the observed schema (RFC 3339)
    pub new_schema_version: String,

    /// All changes, in detection order
    pub changes: Vec<ColumnChange>,

    /// Worst severity across changes, `safe` when there are none
    pub overall_severity: ChangeSeverity,

    /// Counts-based one-line summary
    pub summary: String,
}

impl SchemaDiff {
    /// Roll up a change list into a diff
    pub fn from_changes(
        table_name: impl Into<String>,
        old_schema_version: impl Into<String>,
        new_schema_version: impl Into<String>,
        changes: Vec<ColumnChange>,
    ) -> Self {
        let overall_severity = overall_severity(&changes);
        let summary = summarize(&changes);

        Self {
            table_name: table_name.into(),
            old_schema_version: old_schema_version.into(),
            new_schema_version: new_schema_version.into(),
            changes,
            overall_severity,
            summary,
        }
    }

    /// Keep only the changes matching `keep`, re-deriving severity and summary
    pub fn retain_changes<F>(&mut self, keep: F)
    where
        F: FnMut(&ColumnChange) -> bool,
    {
        self.changes.retain(keep);
        self.overall_severity = overall_severity(&self.changes);
        self.summary = summarize(&self.changes);
    }

    /// Check if any change was detected
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Count changes of one severity
    pub fn count(&self, severity: ChangeSeverity) -> usize {
        self.changes.iter().filter(|c| c.severity == severity).count()
    }

    pub fn breaking_changes(&self) -> Vec<&ColumnChange> {
        self.with_severity(ChangeSeverity::Breaking)
    }

    pub fn warning_changes(&self) -> Vec<&ColumnChange> {
        self.with_severity(ChangeSeverity::Warning)
    }

    pub fn safe_changes(&self) -> Vec<&ColumnChange> {
        self.with_severity(ChangeSeverity::Safe)
    }

    fn with_severity(&self, severity: ChangeSeverity) -> Vec<&ColumnChange> {
        self.changes.iter().filter(|c| c.severity == severity).collect()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Maximum severity across changes, `Safe` when empty
pub fn overall_severity(changes: &[ColumnChange]) -> ChangeSeverity {
    changes
        .iter()
        .map(|c| c.severity)
        .max()
        .unwrap_or_default()
}

/// One-line summary with per-severity counts
pub fn summarize(changes: &[ColumnChange]) -> String {
    if changes.is_empty() {
        return "No schema changes detected. Schemas are identical.".to_string();
    }

    let parts: Vec<String> = ChangeSeverity::ALL
        .iter()
        .rev()
        .filter_map(|severity| {
            let n = changes.iter().filter(|c| c.severity == *severity).count();
            (n > 0).then(|| format!("{} {}", n, severity))
        })
        .collect();

    format!("{} change(s) detected: {}.", changes.len(), parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeType;

    fn change(severity: ChangeSeverity) -> ColumnChange {
        ColumnChange::new(ChangeType::ColumnAdded, "c", severity, "test")
    }

    #[test]
    fn empty_diff() {
        let diff = SchemaDiff::from_changes("orders", "v1", "v2", vec![]);
        assert_eq!(diff.overall_severity, ChangeSeverity::Safe);
        assert!(!diff.has_changes());
        assert!(diff.summary.starts_with("No schema changes detected"));
    }

    #[test]
    fn worst_severity_wins_regardless_of_order() {
        let forward = vec![change(ChangeSeverity::Safe), change(ChangeSeverity::Breaking)];
        let backward = vec![change(ChangeSeverity::Breaking), change(ChangeSeverity::Safe)];

        assert_eq!(overall_severity(&forward), ChangeSeverity::Breaking);
        assert_eq!(overall_severity(&backward), ChangeSeverity::Breaking);
    }

    #[test]
    fn summary_lists_buckets_worst_first() {
        let changes = vec![
            change(ChangeSeverity::Safe),
            change(ChangeSeverity::Breaking),
            change(ChangeSeverity::Safe),
        ];

        assert_eq!(summarize(&changes), "3 change(s) detected: 1 breaking, 2 safe.");
    }

    #[test]
    fn retain_rederives_rollup() {
        let mut diff = SchemaDiff::from_changes(
            "orders",
            "v1",
            "v2",
            vec![change(ChangeSeverity::Warning), change(ChangeSeverity::Breaking)],
        );
        assert_eq!(diff.overall_severity, ChangeSeverity::Breaking);

        diff.retain_changes(|c| c.severity != ChangeSeverity::Breaking);

        assert_eq!(diff.overall_severity, ChangeSeverity::Warning);
        assert_eq!(diff.count(ChangeSeverity::Warning), 1);
        assert_eq!(diff.summary, "1 change(s) detected: 1 warning.");
    }

    #[test]
    fn diff_serialization() {
        let diff = SchemaDiff::from_changes("orders", "v1", "v2", vec![change(ChangeSeverity::Safe)]);
        let json = diff.to_json().unwrap();
        assert!(json.contains("\"overall_severity\": \"safe\""));
        assert!(json.contains("\"changes\""));
    }
}
