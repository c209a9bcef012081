//! Change kinds, severities and per-column change records
//!
//! IMPORTANT: Serialized names of change types and severities are consumed
//! by downstream automation. Never rename them - only add new ones.

use serde::{Deserialize, Serialize};

/// Kind of structural change detected on a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Column present only in the observed schema
    ColumnAdded,

    /// Column present only in the baseline schema
    ColumnRemoved,

    /// Type or refinement grew without invalidating existing data
    TypeWidened,

    /// Any other type or refinement change
    TypeChanged,

    /// NOT NULL -> NULL
    NullabilityRelaxed,

    /// NULL -> NOT NULL
    NullabilityTightened,

    /// Only the default value differs
    DefaultChanged,

    /// Relative order of shared columns differs
    ColumnReordered,
}

impl ChangeType {
    /// Get the change type as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ColumnAdded => "column_added",
            Self::ColumnRemoved => "column_removed",
            Self::TypeWidened => "type_widened",
            Self::TypeChanged => "type_changed",
            Self::NullabilityRelaxed => "nullability_relaxed",
            Self::NullabilityTightened => "nullability_tightened",
            Self::DefaultChanged => "default_changed",
            Self::ColumnReordered => "column_reordered",
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Blast radius of a change
///
/// Totally ordered: `Safe < Warning < Breaking`. The overall severity of a
/// diff is the maximum over its changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSeverity {
    /// Additive, existing consumers unaffected
    #[default]
    Safe,

    /// Potentially breaking, needs review
    Warning,

    /// Will break downstream consumers
    Breaking,
}

impl ChangeSeverity {
    /// All severities, lowest first
    pub const ALL: [ChangeSeverity; 3] = [Self::Safe, Self::Warning, Self::Breaking];

    /// Fixed next-step advice for a diff whose overall severity is `self`
    pub fn advisory(&self) -> &'static str {
        match self {
            Self::Safe => {
                "All changes are safe. The observed schema can be accepted as the new baseline."
            }
            Self::Warning => {
                "Some changes need review. Inspect the warning items before accepting the new baseline."
            }
            Self::Breaking => {
                "Breaking changes detected. Do not auto-apply; escalate or prepare a migration plan."
            }
        }
    }
}

impl std::fmt::Display for ChangeSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "safe"),
            Self::Warning => write!(f, "warning"),
            Self::Breaking => write!(f, "breaking"),
        }
    }
}

/// A single classified change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnChange {
    pub change_type: ChangeType,

    /// Dot-qualified path from the table root, e.g. "user.address.zip"
    pub column_name: String,

    /// Baseline-side snapshot of the attributes relevant to this change
    pub old_value: Option<serde_json::Value>,

    /// Observed-side snapshot of the attributes relevant to this change
    pub new_value: Option<serde_json::Value>,

    pub severity: ChangeSeverity,

    /// Human-readable justification of the severity
    pub reasoning: String,
}

impl ColumnChange {
    /// Create a change with no value snapshots
    pub fn new(
        change_type: ChangeType,
        column_name: impl Into<String>,
        severity: ChangeSeverity,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            change_type,
            column_name: column_name.into(),
            old_value: None,
            new_value: None,
            severity,
            reasoning: reasoning.into(),
        }
    }

    /// Set the old/new value snapshots
    pub fn with_values(
        mut self,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
    ) -> Self {
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_type_stability() {
        assert_eq!(ChangeType::ColumnAdded.as_str(), "column_added");
        assert_eq!(ChangeType::NullabilityTightened.as_str(), "nullability_tightened");
        assert_eq!(
            serde_json::to_string(&ChangeType::ColumnReordered).unwrap(),
            "\"column_reordered\""
        );
    }

    #[test]
    fn severity_is_totally_ordered() {
        assert!(ChangeSeverity::Safe < ChangeSeverity::Warning);
        assert!(ChangeSeverity::Warning < ChangeSeverity::Breaking);
        assert_eq!(ChangeSeverity::ALL.iter().max(), Some(&ChangeSeverity::Breaking));
        assert_eq!(ChangeSeverity::default(), ChangeSeverity::Safe);
    }

    #[test]
    fn change_serialization() {
        let change = ColumnChange::new(
            ChangeType::ColumnRemoved,
            "user.email",
            ChangeSeverity::Breaking,
            "Column 'user.email' was removed",
        )
        .with_values(Some(serde_json::json!({ "col_type": "varchar" })), None);

        let json = serde_json::to_string(&change).unwrap();
        assert!(json.contains("column_removed"));
        assert!(json.contains("breaking"));
        assert!(json.contains("user.email"));
    }
}
