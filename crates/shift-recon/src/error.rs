//! Error types for shift-recon operations.

use thiserror::Error;

/// Structural input errors. Any of these aborts the run for the offending
/// table; value-level problems (bad time tokens, reversed pairs) never surface
/// here and are counted in [`crate::audit::RunAudit`] instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// A required column is missing from a table header.
    #[error("table '{table}': missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    /// An attendance row carries a date that cannot be parsed.
    /// `row` is the 1-based data row number (header excluded).
    #[error("table '{table}', row {row}: cannot parse date '{value}'")]
    InvalidDate {
        table: String,
        row: usize,
        value: String,
    },

    /// A configuration value is out of range or unknown.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ReconError>;
