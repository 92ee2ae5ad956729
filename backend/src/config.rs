//! Application configuration.
//!
//! Centralized constants for the AOS dashboard. Processing options are never
//! configured here: they arrive per interaction as [`crate::ReportOptions`].

use std::time::Duration;

/// Default HTTP port for `aos-dashboard serve`; `AOS_DASHBOARD_PORT` overrides it.
pub const DEFAULT_PORT: u16 = 3000;

/// Maximum upload size accepted by the HTTP layer (in bytes).
///
/// 50 MB limit.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Delimiter used by the text exports of the receivables system.
pub const TEXT_DELIMITER: u8 = b'|';

/// Monetary amount column.
pub const AMOUNT_COLUMN: &str = "MTXVAL";

/// Days-overdue column.
pub const OVERDUE_COLUMN: &str = "OVER DUE";

/// Invoice date column (`YYYYMMDD` in text exports).
pub const INVOICE_DATE_COLUMN: &str = "TGL INVOICE";

/// Due date column (`YYYYMMDD` in text exports).
pub const DUE_DATE_COLUMN: &str = "TGL JATUH TEMPO";

/// Column appended by the categorizer.
pub const CATEGORY_COLUMN: &str = "KATEGORI OVER DUE";

/// Sheet name used for every exported workbook.
pub const EXPORT_SHEET_NAME: &str = "Sheet1";

/// MIME type of exported workbooks.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Download name of the tidied overdue table.
pub const OVERDUE_EXPORT_FILENAME: &str = "data_rapi_piutang_overdue.xlsx";

/// Download name of the overdue bucket summary.
pub const SUMMARY_EXPORT_FILENAME: &str = "overdue_summary.xlsx";

/// Download name of the parsed opname table.
pub const OPNAME_EXPORT_FILENAME: &str = "data_rapi_opname_faktur.xlsx";

/// Maximum number of per-cell format problems reported back to the caller.
pub const MAX_REPORTED_FORMAT_ERRORS: usize = 10;

/// Capacity of the log broadcast channel.
pub const LOG_CHANNEL_CAPACITY: usize = 100;

/// Sessions untouched for this long are dropped when a new one is created.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Upper bound on live sessions; the least recently used one makes room.
pub const MAX_SESSIONS: usize = 256;
