//! SchemaDrift Core
//!
//! Core domain model with stable, versioned types.
//! Never rename change types or severities - they are part of the public API.

pub mod change;
pub mod schema;
pub mod report;
pub mod envelope;
pub mod config;

pub use change::{ChangeType, ChangeSeverity, ColumnChange};
pub use schema::{ColumnType, ColumnSchema, TableSchema, UnknownColumnType};
pub use report::SchemaDiff;
pub use envelope::{ToolResult, DiffPayload};
pub use config::{Config, ConfigError, IgnoreRules, OutputFormat};
