//! Error types for the overdue report pipeline.
//!
//! This module defines the error hierarchy used across the crate:
//!
//! - [`LoadError`] - the source file cannot be read at all (fatal for that file)
//! - [`TableError`] - a table shape invariant was violated
//! - [`MissingColumnError`] - a stage needs columns the source lacks (warning)
//! - [`FormatError`] - a single cell failed a formatting rule (warning)
//! - [`EmptyResultWarning`] - a stage had no rows to work with (warning)
//! - [`ExportError`] - spreadsheet serialization failed
//! - [`ReportError`] - top-level per-file error
//! - [`ServerError`] - HTTP layer errors
//!
//! Non-fatal conditions are gathered into [`ReportWarning`] so that a report
//! can carry them next to whatever output still succeeded.

use thiserror::Error;

use crate::session::FileSlot;

// =============================================================================
// Loading Errors
// =============================================================================

/// Errors while reading an uploaded file into a table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Zero bytes uploaded.
    #[error("File is empty")]
    EmptyFile,

    /// No header line could be found.
    #[error("No header row found")]
    NoHeaders,

    /// The bytes are not valid in the detected encoding.
    #[error("Cannot decode file as {encoding}")]
    Encoding { encoding: String },

    /// The content is binary, not delimited text.
    #[error("File contains binary data and is not a delimited text export")]
    Binary,

    /// The delimited text could not be tokenized.
    #[error("Invalid delimited text: {0}")]
    Delimited(String),

    /// The spreadsheet container is corrupt or unsupported.
    #[error("Cannot read spreadsheet: {0}")]
    Spreadsheet(String),

    /// The workbook has no worksheet.
    #[error("Spreadsheet has no worksheet")]
    NoWorksheet,

    /// The parsed rows do not form a valid table.
    #[error("Invalid table: {0}")]
    Table(#[from] TableError),
}

// =============================================================================
// Table Shape Errors
// =============================================================================

/// Violations of the table invariants (equal column lengths, unique names).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TableError {
    /// A row does not have one cell per column.
    #[error("Row has {found} cells but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },

    /// A column does not have one cell per row.
    #[error("Column '{column}' has {found} cells but the table has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    /// Two columns share a name.
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}

// =============================================================================
// Stage Warnings
// =============================================================================

/// A stage needs columns that the source table does not have.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Missing column(s): {}", .columns.join(", "))]
pub struct MissingColumnError {
    /// Every missing column, in the order they were requested.
    pub columns: Vec<String>,
}

/// A single cell could not be parsed by a formatting rule.
///
/// The cell receives the rule's sentinel value instead.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Column '{column}', row {row} (value '{value}'): not a valid {rule}")]
pub struct FormatError {
    pub column: String,
    /// Zero-based data row index.
    pub row: usize,
    pub value: String,
    /// Rule name (`currency` or `date`).
    pub rule: &'static str,
}

/// A stage had no rows to work with; nothing was rendered for it.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("No data for {step}")]
pub struct EmptyResultWarning {
    /// Human-readable name of the stage that produced nothing.
    pub step: &'static str,
}

impl EmptyResultWarning {
    pub fn new(step: &'static str) -> Self {
        Self { step }
    }
}

/// Any non-fatal condition raised while building a report.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReportWarning {
    #[error(transparent)]
    MissingColumns(#[from] MissingColumnError),

    #[error(transparent)]
    Format(#[from] FormatError),

    /// Further format errors were found but not listed individually.
    #[error("{omitted} more cell(s) could not be formatted")]
    FormatOverflow { omitted: usize },

    #[error(transparent)]
    EmptyResult(#[from] EmptyResultWarning),
}

impl ReportWarning {
    /// Stable identifier for API consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            ReportWarning::MissingColumns(_) => "missingColumns",
            ReportWarning::Format(_) | ReportWarning::FormatOverflow { .. } => "format",
            ReportWarning::EmptyResult(_) => "emptyResult",
        }
    }
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing a table to a spreadsheet.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing to export.
    #[error(transparent)]
    Empty(#[from] EmptyResultWarning),

    /// The workbook writer failed.
    #[error("Failed to create Excel: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

// =============================================================================
// Report Errors (top-level, per file)
// =============================================================================

/// Top-level error for one file's report.
///
/// Callers turn this into a user-visible message; it never aborts the
/// processing of another file.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The file could not be loaded.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// A spreadsheet could not be produced.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// A requested artifact depends on a stage that produced only a warning.
    #[error("{0}")]
    Unavailable(#[from] ReportWarning),

    /// Nothing has been uploaded to this slot yet.
    #[error("No {0} file uploaded")]
    NoUpload(FileSlot),

    /// The last upload to this slot failed.
    #[error("Last {slot} upload failed: {message}")]
    UploadFailed { slot: FileSlot, message: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Report error.
    #[error("{0}")]
    Report(#[from] ReportError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Unknown resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // LoadError -> ReportError
        let load_err = LoadError::EmptyFile;
        let report_err: ReportError = load_err.into();
        assert!(report_err.to_string().contains("empty"));

        // EmptyResultWarning -> ExportError -> ReportError
        let export_err: ExportError = EmptyResultWarning::new("export").into();
        let report_err: ReportError = export_err.into();
        assert!(report_err.to_string().contains("No data for export"));
    }

    #[test]
    fn test_missing_column_message_lists_all() {
        let err = MissingColumnError {
            columns: vec!["OVER DUE".into(), "MTXVAL".into()],
        };
        assert_eq!(err.to_string(), "Missing column(s): OVER DUE, MTXVAL");

        let warning: ReportWarning = err.into();
        assert_eq!(warning.kind(), "missingColumns");
    }

    #[test]
    fn test_format_error_message() {
        let err = FormatError {
            column: "TGL INVOICE".into(),
            row: 3,
            value: "2024-13-01".into(),
            rule: "date",
        };
        let msg = err.to_string();
        assert!(msg.contains("TGL INVOICE"));
        assert!(msg.contains("row 3"));
        assert!(msg.contains("not a valid date"));
    }

    #[test]
    fn test_upload_failed_names_slot() {
        let err = ReportError::UploadFailed {
            slot: FileSlot::Opname,
            message: "File is empty".into(),
        };
        assert_eq!(err.to_string(), "Last opname upload failed: File is empty");
    }
}
