//! JSON response types shared by the HTTP API and the CLI.
//!
//! Reports are flattened into display-ready views: formatted sums and
//! percentage ratios next to the raw numbers, warnings with a stable `kind`,
//! and download links for the spreadsheets a session can produce.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ReportWarning;
use crate::models::{OverdueBucket, Table};
use crate::parser::SourceInfo;
use crate::render::chart::ChartSpec;
use crate::session::{ExportArtifact, SessionReport, SlotOutcome};
use crate::transform::aggregate::Summary;
use crate::transform::format::format_rupiah;
use crate::transform::pipeline::{OpnameReport, OverdueReport, ReportOptions};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: Uuid,
}

/// A warning as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarningView {
    /// `missingColumns`, `format` or `emptyResult`.
    pub kind: &'static str,
    pub message: String,
}

impl From<&ReportWarning> for WarningView {
    fn from(warning: &ReportWarning) -> Self {
        Self {
            kind: warning.kind(),
            message: warning.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub artifact: ExportArtifact,
    pub file_name: &'static str,
    /// Relative URL; empty when the report was not produced by a session.
    pub url: String,
}

impl DownloadLink {
    pub fn new(artifact: ExportArtifact, session_id: Option<Uuid>) -> Self {
        let url = session_id
            .map(|id| format!("/api/sessions/{}/export/{}", id, artifact.as_str()))
            .unwrap_or_default();
        Self {
            artifact,
            file_name: artifact.file_name(),
            url,
        }
    }
}

/// One bucket of the summary, ready for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRowView {
    pub bucket: OverdueBucket,
    pub sum: i64,
    pub sum_formatted: String,
    pub count: usize,
    pub ratio_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub rows: Vec<SummaryRowView>,
    pub grand_total: i64,
    pub grand_total_formatted: String,
    pub source_rows: usize,
    pub bucketed_rows: usize,
}

impl From<&Summary> for SummaryView {
    fn from(summary: &Summary) -> Self {
        Self {
            rows: summary
                .rows
                .iter()
                .map(|row| SummaryRowView {
                    bucket: row.bucket,
                    sum: row.sum,
                    sum_formatted: format_rupiah(row.sum),
                    count: row.count,
                    ratio_percent: row.ratio_percent(),
                })
                .collect(),
            grand_total: summary.grand_total,
            grand_total_formatted: format_rupiah(summary.grand_total),
            source_rows: summary.source_rows,
            bucketed_rows: summary.bucketed_rows,
        }
    }
}

/// Overdue report as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueReportResponse {
    /// `ready` or `warning`.
    pub status: &'static str,
    pub source: SourceInfo,
    pub options: ReportOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSpec>,
    pub warnings: Vec<WarningView>,
    pub downloads: Vec<DownloadLink>,
}

impl OverdueReportResponse {
    pub fn new(source: &SourceInfo, report: &OverdueReport, session_id: Option<Uuid>) -> Self {
        let mut downloads = Vec::new();
        if report.tidy.as_ref().is_some_and(|t| !t.is_empty()) {
            downloads.push(DownloadLink::new(ExportArtifact::DataRapi, session_id));
        }
        if report.summary.is_some() {
            downloads.push(DownloadLink::new(ExportArtifact::Summary, session_id));
        }

        Self {
            status: status_of(&report.warnings),
            source: source.clone(),
            options: report.options,
            table: report.table.clone(),
            summary: report.summary.as_ref().map(SummaryView::from),
            chart: report.chart.clone(),
            warnings: report.warnings.iter().map(WarningView::from).collect(),
            downloads,
        }
    }
}

/// Opname report as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpnameReportResponse {
    pub status: &'static str,
    pub source: SourceInfo,
    pub table: Table,
    pub warnings: Vec<WarningView>,
    pub downloads: Vec<DownloadLink>,
}

impl OpnameReportResponse {
    pub fn new(source: &SourceInfo, report: &OpnameReport, session_id: Option<Uuid>) -> Self {
        let downloads = if report.table.is_empty() {
            Vec::new()
        } else {
            vec![DownloadLink::new(ExportArtifact::Opname, session_id)]
        };

        Self {
            status: status_of(&report.warnings),
            source: source.clone(),
            table: report.table.clone(),
            warnings: report.warnings.iter().map(WarningView::from).collect(),
            downloads,
        }
    }
}

/// Per-slot entry of the combined session report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse<T> {
    /// `empty`, `ready` or `error`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<T>,
}

impl<T> SlotResponse<T> {
    fn from_outcome<R>(outcome: &SlotOutcome<R>, view: impl FnOnce(&SourceInfo, &R) -> T) -> Self {
        match outcome {
            SlotOutcome::Empty => Self { status: "empty", error: None, report: None },
            SlotOutcome::Ready { source, report } => Self {
                status: "ready",
                error: None,
                report: Some(view(source, report)),
            },
            SlotOutcome::Failed(message) => Self {
                status: "error",
                error: Some(message.clone()),
                report: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReportResponse {
    pub session_id: Uuid,
    pub options: ReportOptions,
    pub overdue: SlotResponse<OverdueReportResponse>,
    pub opname: SlotResponse<OpnameReportResponse>,
}

impl SessionReportResponse {
    pub fn new(session_id: Uuid, options: ReportOptions, report: &SessionReport) -> Self {
        let id = Some(session_id);
        Self {
            session_id,
            options,
            overdue: SlotResponse::from_outcome(&report.overdue, |source, r| {
                OverdueReportResponse::new(source, r, id)
            }),
            opname: SlotResponse::from_outcome(&report.opname, |source, r| {
                OpnameReportResponse::new(source, r, id)
            }),
        }
    }
}

fn status_of(warnings: &[ReportWarning]) -> &'static str {
    if warnings.is_empty() {
        "ready"
    } else {
        "warning"
    }
}

/// Error body used by every failing endpoint.
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::load;
    use crate::session::{FileSlot, SessionContext};
    use crate::transform::pipeline::{build_opname_report, build_overdue_report};

    const OVERDUE: &str = "NAMA|OVER DUE|MTXVAL\nA|10|1000\nB|20|2000\nC|70|3000";

    #[test]
    fn test_overdue_response_json() {
        let loaded = load("piutang.txt", OVERDUE.as_bytes()).unwrap();
        let report = build_overdue_report(&loaded.table, &ReportOptions::all());
        let session = Uuid::new_v4();
        let response = OverdueReportResponse::new(&loaded.info, &report, Some(session));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "ready");
        assert_eq!(json["source"]["rowCount"], 3);
        assert_eq!(json["summary"]["rows"][0]["bucket"], "1-14");
        assert_eq!(json["summary"]["rows"][0]["sumFormatted"], "Rp1.000");
        assert_eq!(json["summary"]["rows"][0]["ratioPercent"], 16.67);
        assert_eq!(json["summary"]["grandTotalFormatted"], "Rp6.000");
        assert_eq!(json["chart"]["data"][0]["type"], "bar");
        assert_eq!(json["table"]["rows"][0][2], "Rp1.000");

        let urls: Vec<&str> = response.downloads.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                format!("/api/sessions/{}/export/data-rapi", session),
                format!("/api/sessions/{}/export/summary", session),
            ]
        );
    }

    #[test]
    fn test_warnings_switch_status() {
        let loaded = load("piutang.txt", b"NAMA\nA").unwrap();
        let options = ReportOptions { summary: true, ..Default::default() };
        let report = build_overdue_report(&loaded.table, &options);
        let response = OverdueReportResponse::new(&loaded.info, &report, None);

        assert_eq!(response.status, "warning");
        assert_eq!(response.warnings[0].kind, "missingColumns");
        assert!(response.summary.is_none());
        assert!(response.downloads.is_empty());
    }

    #[test]
    fn test_opname_response() {
        let loaded = load("opname.txt", b"NO FAKTUR|STATUS\nF-1|OK").unwrap();
        let report = build_opname_report(&loaded.table);
        let response = OpnameReportResponse::new(&loaded.info, &report, None);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["table"]["columns"][0], "NO FAKTUR");
        assert_eq!(json["downloads"][0]["artifact"], "opname");
        assert_eq!(json["downloads"][0]["url"], "");
    }

    #[test]
    fn test_session_report_slots() {
        let mut session = SessionContext::new();
        session.upload(FileSlot::Opname, "opname.txt", b"NO FAKTUR\nF-1").unwrap();
        let _ = session.upload(FileSlot::Overdue, "piutang.txt", b"");

        let id = Uuid::new_v4();
        let response = SessionReportResponse::new(id, session.options(), &session.report_all());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["overdue"]["status"], "error");
        assert!(json["overdue"]["error"].as_str().unwrap().contains("File is empty"));
        assert!(json["overdue"].get("report").is_none());
        assert_eq!(json["opname"]["status"], "ready");
        assert_eq!(json["opname"]["report"]["source"]["fileName"], "opname.txt");
    }

    #[test]
    fn test_empty_slot_response() {
        let response = SessionReportResponse::new(
            Uuid::new_v4(),
            ReportOptions::default(),
            &SessionContext::new().report_all(),
        );
        let json = serde_json::to_value(&response.overdue).unwrap();
        assert_eq!(json, json!({ "status": "empty" }));
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("No file provided");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "No file provided");
    }
}
