//! # AOS Dashboard - overdue receivables reports
//!
//! Turns a Piutang Overdue export (pipe-delimited text or `.xlsx`) into a
//! tidy table, an aging summary per overdue bucket, a chart description and
//! downloadable spreadsheets. An Opname Faktur file can be loaded next to it
//! and is shown as-is.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ .txt / .xlsx│────▶│   Parser    │────▶│  Transform  │────▶│   Render    │
//! │  (any enc.) │     │  (auto-enc) │     │ tidy/bucket │     │ chart/xlsx  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aos_dashboard::{load_file, build_overdue_report, ReportOptions};
//!
//! let loaded = load_file("piutang.txt")?;
//! let report = build_overdue_report(&loaded.table, &ReportOptions::all());
//! if let Some(summary) = &report.summary {
//!     for row in &summary.rows {
//!         println!("{}: {} ({} rows)", row.bucket, row.sum, row.count);
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Column names, limits and file names
//! - [`models`] - Cells, tables, buckets
//! - [`parser`] - Delimited text and spreadsheet loading
//! - [`validation`] - Required-column checks
//! - [`transform`] - Formatting rules, categorization, aggregation, pipeline
//! - [`render`] - Chart description and `.xlsx` export
//! - [`session`] - Per-user state between interactions
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Loading
pub mod parser;

// Column checks
pub mod validation;

// Transformation
pub mod transform;

// Output
pub mod render;

// State
pub mod session;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    EmptyResultWarning, ExportError, FormatError, LoadError, MissingColumnError, ReportError,
    ReportWarning, ServerError, TableError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{AggregateRow, Cell, Column, FileKind, OverdueBucket, Row, Table};

// =============================================================================
// Re-exports - Loading
// =============================================================================

pub use parser::{
    decode_content, detect_encoding, load, load_file, load_spreadsheet, parse_delimited,
    LoadedTable, SourceInfo,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    aggregate, amount_of, apply_rules, categorize, format_rupiah, summarize, tidy_rules,
    FormatRule, Summary,
};

pub use transform::pipeline::{
    build_opname_report, build_overdue_report, export_summary, export_tidy, tidy_table,
    OpnameReport, OverdueReport, ReportOptions,
};

// =============================================================================
// Re-exports - Render
// =============================================================================

pub use render::{overdue_chart, table_to_xlsx, ChartSpec};

// =============================================================================
// Re-exports - Session
// =============================================================================

pub use session::{ExportArtifact, FileSlot, SessionContext, SessionReport, SessionStore, SlotOutcome};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{
    error_response, OpnameReportResponse, OverdueReportResponse, SessionReportResponse,
};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
