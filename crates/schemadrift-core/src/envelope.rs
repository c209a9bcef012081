//! Result envelope returned by every public comparison operation

use serde::{Deserialize, Serialize};
use crate::report::SchemaDiff;

/// Payload of a successful comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffPayload {
    pub diff: SchemaDiff,
}

/// Success/data/error/hint wrapper
///
/// Either `data` holds a complete diff, or `error` explains why there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DiffPayload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Suggested next step for the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action_hint: Option<String>,
}

impl ToolResult {
    /// Successful result carrying a diff, hinted by its overall severity
    pub fn ok(diff: SchemaDiff) -> Self {
        let hint = diff.overall_severity.advisory();
        Self {
            success: true,
            data: Some(DiffPayload { diff }),
            error: None,
            next_action_hint: Some(hint.to_string()),
        }
    }

    /// Failed result with no diff
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            next_action_hint: None,
        }
    }

    /// Override the hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.next_action_hint = Some(hint.into());
        self
    }

    /// The diff, if the comparison succeeded
    pub fn diff(&self) -> Option<&SchemaDiff> {
        self.data.as_ref().map(|d| &d.diff)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
