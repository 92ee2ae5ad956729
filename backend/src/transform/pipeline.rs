//! Report pipeline: one file, one set of options, one report.
//!
//! The overdue report combines every stage:
//!
//! ```text
//! raw table ──▶ Formatter ("Data Rapi") ──▶ displayed / exported table
//!     │
//!     └──────▶ Categorizer ──▶ Aggregator ──▶ summary ──▶ chart
//! ```
//!
//! Categorization and aggregation always read the raw table so that sums
//! come from amounts, never from display text. Stage problems become
//! [`ReportWarning`]s; building a report never fails once a table exists.
//!
//! # Example
//!
//! ```rust,ignore
//! use aos_dashboard::{load, build_overdue_report, ReportOptions};
//!
//! let loaded = load("piutang.txt", &bytes)?;
//! let options = ReportOptions { tidy: true, summary: true, chart: true, ..Default::default() };
//! let report = build_overdue_report(&loaded.table, &options);
//! for warning in &report.warnings {
//!     eprintln!("{}", warning);
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::aggregate::{summarize, Summary};
use super::format::{apply_rules, tidy_rules};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::config::MAX_REPORTED_FORMAT_ERRORS;
use crate::error::{EmptyResultWarning, ExportResult, ReportWarning};
use crate::models::Table;
use crate::render::chart::{overdue_chart, ChartSpec};
use crate::render::export::table_to_xlsx;

/// Per-interaction switches for the overdue report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportOptions {
    /// "Data Rapi": format currency and date columns.
    pub tidy: bool,
    /// "Tabel": include the (possibly tidied) table.
    pub table: bool,
    /// Include the per-bucket summary.
    pub summary: bool,
    /// "Grafik": include the chart description.
    pub chart: bool,
}

impl ReportOptions {
    /// Every output switched on.
    pub fn all() -> Self {
        Self {
            tidy: true,
            table: true,
            summary: true,
            chart: true,
        }
    }
}

/// Output of the overdue pipeline for one file.
#[derive(Debug, Clone)]
pub struct OverdueReport {
    pub options: ReportOptions,
    /// Tidied table, when `tidy` is on.
    pub tidy: Option<Table>,
    /// Displayed table, when `table` is on (tidied if `tidy` is also on).
    pub table: Option<Table>,
    /// Bucket summary, when `summary` is on and the columns exist.
    pub summary: Option<Summary>,
    /// Chart description, when `chart` is on and the columns exist.
    pub chart: Option<ChartSpec>,
    pub warnings: Vec<ReportWarning>,
}

/// Output of the opname pipeline for one file.
#[derive(Debug, Clone)]
pub struct OpnameReport {
    pub table: Table,
    pub warnings: Vec<ReportWarning>,
}

/// Run the overdue pipeline on a loaded table.
pub fn build_overdue_report(source: &Table, options: &ReportOptions) -> OverdueReport {
    log_info(format!(
        "📋 Overdue table: {} rows × {} columns",
        source.len(),
        source.width()
    ));

    let mut warnings: Vec<ReportWarning> = Vec::new();

    let tidy = options.tidy.then(|| {
        log_info("🧹 Applying Data Rapi rules...");
        let (table, format_warnings) = tidy_table(source);
        if format_warnings.is_empty() {
            log_success("All cells formatted");
        } else {
            log_warning(format!("{} cell(s) fell back to a default", count_format_errors(&format_warnings)));
        }
        warnings.extend(format_warnings);
        table
    });

    let table = options
        .table
        .then(|| tidy.clone().unwrap_or_else(|| source.clone()));

    let summary = if options.summary || options.chart {
        log_info("📊 Bucketing by days overdue...");
        match summarize(source) {
            Ok(summary) => {
                for row in &summary.rows {
                    log_info_indent(format!("{}: {} rows, total {}", row.bucket, row.count, row.sum), 1);
                }
                log_success(format!(
                    "{} of {} rows bucketed",
                    summary.bucketed_rows, summary.source_rows
                ));
                Some(summary)
            }
            Err(warning) => {
                log_warning(warning.to_string());
                warnings.push(warning);
                None
            }
        }
    } else {
        None
    };

    let chart = if options.chart {
        summary.as_ref().and_then(|s| match overdue_chart(&s.rows) {
            Ok(chart) => Some(chart),
            Err(warning) => {
                warnings.push(warning.into());
                None
            }
        })
    } else {
        None
    };

    OverdueReport {
        options: *options,
        tidy,
        table,
        summary: if options.summary { summary } else { None },
        chart,
        warnings,
    }
}

/// Run the opname pipeline: the parsed table is shown as-is.
pub fn build_opname_report(source: &Table) -> OpnameReport {
    log_info(format!(
        "📋 Opname table: {} rows × {} columns",
        source.len(),
        source.width()
    ));

    let mut warnings = Vec::new();
    if source.is_empty() {
        let warning: ReportWarning = EmptyResultWarning::new("opname table").into();
        log_warning(warning.to_string());
        warnings.push(warning);
    }

    OpnameReport {
        table: source.clone(),
        warnings,
    }
}

/// Apply the Data Rapi rules, turning cell failures into capped warnings.
pub fn tidy_table(source: &Table) -> (Table, Vec<ReportWarning>) {
    let outcome = apply_rules(source, &tidy_rules());
    let total = outcome.errors.len();

    let mut warnings: Vec<ReportWarning> = outcome
        .errors
        .into_iter()
        .take(MAX_REPORTED_FORMAT_ERRORS)
        .map(ReportWarning::from)
        .collect();
    if total > MAX_REPORTED_FORMAT_ERRORS {
        warnings.push(ReportWarning::FormatOverflow {
            omitted: total - MAX_REPORTED_FORMAT_ERRORS,
        });
    }

    (outcome.table, warnings)
}

fn count_format_errors(warnings: &[ReportWarning]) -> usize {
    warnings
        .iter()
        .map(|w| match w {
            ReportWarning::FormatOverflow { omitted } => *omitted,
            _ => 1,
        })
        .sum()
}

/// Spreadsheet of the tidied overdue table.
pub fn export_tidy(source: &Table) -> ExportResult<Vec<u8>> {
    let (table, _) = tidy_table(source);
    table_to_xlsx(&table)
}

/// Spreadsheet of the bucket summary.
pub fn export_summary(summary: &Summary) -> ExportResult<Vec<u8>> {
    table_to_xlsx(&summary.to_table())
}
