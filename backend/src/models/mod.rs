//! Domain models for the overdue report pipeline.
//!
//! - [`Cell`] - one typed value in a table
//! - [`Table`] - named columns of equal length, rows aligned by position
//! - [`FileKind`] - spreadsheet or pipe-delimited text
//! - [`OverdueBucket`] - the four fixed day-count ranges
//! - [`AggregateRow`] - per-bucket sum, count and share of the grand total

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub mod table;

pub use table::{Column, Row, Table};

/// Display format for dates, both in tables and in JSON.
pub const DISPLAY_DATE_FORMAT: &str = "%d-%m-%Y";

// =============================================================================
// Cell
// =============================================================================

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    Missing,
}

impl Cell {
    /// Build a cell from a raw text field; empty fields are missing.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Cell::Missing
        } else {
            Cell::Text(field.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric reading of the cell.
    ///
    /// Text is trimmed and parsed; dates and missing cells have no number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Decimal(d) if d.is_finite() => Some(*d),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Decimal(d) => write!(f, "{}", d),
            Cell::Date(d) => write!(f, "{}", d.format(DISPLAY_DATE_FORMAT)),
            Cell::Missing => Ok(()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Integer(i) => serializer.serialize_i64(*i),
            Cell::Decimal(d) => serializer.serialize_f64(*d),
            Cell::Date(d) => serializer.collect_str(&d.format(DISPLAY_DATE_FORMAT)),
            Cell::Missing => serializer.serialize_none(),
        }
    }
}

// =============================================================================
// File Kind
// =============================================================================

/// How an upload is parsed, decided by its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// `.xlsx` workbook.
    Spreadsheet,
    /// Pipe-delimited text export.
    Delimited,
}

impl FileKind {
    /// `.xlsx` (any case) is a spreadsheet, everything else delimited text.
    pub fn from_file_name(name: &str) -> Self {
        if name.to_lowercase().ends_with(".xlsx") {
            FileKind::Spreadsheet
        } else {
            FileKind::Delimited
        }
    }
}

// =============================================================================
// Overdue Bucket
// =============================================================================

/// Ordinal overdue-age category.
///
/// Ranges are `(0,14]`, `(14,30]`, `(30,60]` and `(60,∞)`; a day-count of
/// zero or less belongs to no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverdueBucket {
    UpTo14,
    UpTo30,
    UpTo60,
    Over60,
}

impl OverdueBucket {
    /// All buckets in report order.
    pub const ALL: [OverdueBucket; 4] = [
        OverdueBucket::UpTo14,
        OverdueBucket::UpTo30,
        OverdueBucket::UpTo60,
        OverdueBucket::Over60,
    ];

    pub fn from_days(days: f64) -> Option<Self> {
        if days.is_nan() || days <= 0.0 {
            None
        } else if days <= 14.0 {
            Some(OverdueBucket::UpTo14)
        } else if days <= 30.0 {
            Some(OverdueBucket::UpTo30)
        } else if days <= 60.0 {
            Some(OverdueBucket::UpTo60)
        } else {
            Some(OverdueBucket::Over60)
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.label() == label.trim())
    }

    pub fn label(&self) -> &'static str {
        match self {
            OverdueBucket::UpTo14 => "1-14",
            OverdueBucket::UpTo30 => "15-30",
            OverdueBucket::UpTo60 => "31-60",
            OverdueBucket::Over60 => "60+",
        }
    }
}

impl fmt::Display for OverdueBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for OverdueBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// =============================================================================
// Aggregate Row
// =============================================================================

/// Summary of one populated bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRow {
    pub bucket: OverdueBucket,
    /// Sum of the monetary column over the bucket's rows.
    pub sum: i64,
    /// Number of rows in the bucket.
    pub count: usize,
    /// `sum` divided by the grand total of the whole source table.
    pub ratio: f64,
}

impl AggregateRow {
    /// Ratio as a percentage rounded to two decimals.
    pub fn ratio_percent(&self) -> f64 {
        (self.ratio * 10_000.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(OverdueBucket::from_days(-3.0), None);
        assert_eq!(OverdueBucket::from_days(0.0), None);
        assert_eq!(OverdueBucket::from_days(1.0), Some(OverdueBucket::UpTo14));
        assert_eq!(OverdueBucket::from_days(14.0), Some(OverdueBucket::UpTo14));
        assert_eq!(OverdueBucket::from_days(15.0), Some(OverdueBucket::UpTo30));
        assert_eq!(OverdueBucket::from_days(30.0), Some(OverdueBucket::UpTo30));
        assert_eq!(OverdueBucket::from_days(31.0), Some(OverdueBucket::UpTo60));
        assert_eq!(OverdueBucket::from_days(60.0), Some(OverdueBucket::UpTo60));
        assert_eq!(OverdueBucket::from_days(61.0), Some(OverdueBucket::Over60));
        assert_eq!(OverdueBucket::from_days(f64::NAN), None);
    }

    #[test]
    fn test_fractional_days_use_half_open_ranges() {
        assert_eq!(OverdueBucket::from_days(0.5), Some(OverdueBucket::UpTo14));
        assert_eq!(OverdueBucket::from_days(14.5), Some(OverdueBucket::UpTo30));
        assert_eq!(OverdueBucket::from_days(60.1), Some(OverdueBucket::Over60));
    }

    #[test]
    fn test_bucket_labels_round_trip_and_order() {
        for bucket in OverdueBucket::ALL {
            assert_eq!(OverdueBucket::from_label(bucket.label()), Some(bucket));
        }
        assert!(OverdueBucket::UpTo14 < OverdueBucket::UpTo30);
        assert!(OverdueBucket::UpTo60 < OverdueBucket::Over60);
        assert_eq!(OverdueBucket::from_label("90+"), None);
    }

    #[test]
    fn test_file_kind_from_name() {
        assert_eq!(FileKind::from_file_name("overdue.xlsx"), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_file_name("OVERDUE.XLSX"), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_file_name("overdue.txt"), FileKind::Delimited);
        assert_eq!(FileKind::from_file_name("overdue.xls"), FileKind::Delimited);
    }

    #[test]
    fn test_cell_numbers() {
        assert_eq!(Cell::Text(" 12 ".into()).as_number(), Some(12.0));
        assert_eq!(Cell::Integer(7).as_number(), Some(7.0));
        assert_eq!(Cell::Text("abc".into()).as_number(), None);
        assert_eq!(Cell::Missing.as_number(), None);
        assert_eq!(Cell::Decimal(f64::INFINITY).as_number(), None);
    }

    #[test]
    fn test_cell_json() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let cells = vec![
            Cell::Text("A".into()),
            Cell::Integer(3),
            Cell::Date(date),
            Cell::Missing,
        ];
        let json = serde_json::to_value(&cells).unwrap();
        assert_eq!(json, serde_json::json!(["A", 3, "05-01-2024", null]));
    }

    #[test]
    fn test_ratio_percent_rounding() {
        let row = AggregateRow {
            bucket: OverdueBucket::UpTo14,
            sum: 1000,
            count: 1,
            ratio: 1000.0 / 6000.0,
        };
        assert_eq!(row.ratio_percent(), 16.67);
    }
}
