//! Aggregator: per-bucket sums and counts of the monetary column.
//!
//! # Ratio denominator
//!
//! Each bucket's ratio is its sum divided by the grand total of the *entire*
//! source table, unbucketed rows included. Ratios therefore add up to less
//! than 100% when some rows have no bucket.

use serde::Serialize;

use super::categorize::categorize;
use super::format::format_rupiah;
use crate::config::CATEGORY_COLUMN;
use crate::error::{EmptyResultWarning, ReportWarning};
use crate::models::{AggregateRow, Cell, OverdueBucket, Table};
use crate::validation::CategorizedColumns;

/// Column headers of the summary table.
pub const SUMMARY_COLUMNS: [&str; 5] = [
    CATEGORY_COLUMN,
    "TOTAL MTXVAL",
    "TOTAL MTXVAL (Rp)",
    "JUMLAH",
    "RASIO (%)",
];

/// Aggregate rows plus the totals they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Populated buckets in bucket order.
    pub rows: Vec<AggregateRow>,
    /// Sum of the monetary column over every source row.
    pub grand_total: i64,
    pub source_rows: usize,
    pub bucketed_rows: usize,
}

impl Summary {
    /// Summary as a table for display and export.
    pub fn to_table(&self) -> Table {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                vec![
                    Cell::Text(row.bucket.label().to_string()),
                    Cell::Integer(row.sum),
                    Cell::Text(format_rupiah(row.sum)),
                    Cell::Integer(row.count as i64),
                    Cell::Decimal(row.ratio_percent()),
                ]
            })
            .collect();

        match Table::from_rows(SUMMARY_COLUMNS.to_vec(), rows) {
            Ok(table) => table,
            Err(e) => unreachable!("summary rows match SUMMARY_COLUMNS: {}", e),
        }
    }
}

/// Group a categorized table by bucket.
///
/// Returns [`ReportWarning::EmptyResult`] when no row has a bucket.
pub fn aggregate(categorized: &Table) -> Result<Summary, ReportWarning> {
    let columns = CategorizedColumns::check(categorized)?;

    let mut sums = [0i64; 4];
    let mut counts = [0usize; 4];
    let mut grand_total = 0i64;

    for row in 0..categorized.len() {
        let amount = columns.amount(row);
        grand_total = grand_total.saturating_add(amount);
        if let Some(bucket) = columns.bucket(row) {
            let slot = bucket as usize;
            sums[slot] = sums[slot].saturating_add(amount);
            counts[slot] += 1;
        }
    }

    let rows: Vec<AggregateRow> = OverdueBucket::ALL
        .into_iter()
        .filter(|bucket| counts[*bucket as usize] > 0)
        .map(|bucket| {
            let sum = sums[bucket as usize];
            AggregateRow {
                bucket,
                sum,
                count: counts[bucket as usize],
                ratio: if grand_total == 0 {
                    0.0
                } else {
                    sum as f64 / grand_total as f64
                },
            }
        })
        .collect();

    if rows.is_empty() {
        return Err(EmptyResultWarning::new("overdue summary").into());
    }

    let bucketed_rows = rows.iter().map(|r| r.count).sum();
    Ok(Summary {
        rows,
        grand_total,
        source_rows: categorized.len(),
        bucketed_rows,
    })
}

/// Categorize then aggregate a raw overdue table.
pub fn summarize(table: &Table) -> Result<Summary, ReportWarning> {
    let categorized = categorize(table)?;
    aggregate(&categorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overdue(rows: &[(&str, &str)]) -> Table {
        let rows = rows
            .iter()
            .map(|(d, v)| vec![Cell::from_field(d), Cell::from_field(v)])
            .collect();
        Table::from_rows(vec!["OVER DUE", "MTXVAL"], rows).unwrap()
    }

    #[test]
    fn test_three_bucket_scenario() {
        let table = overdue(&[("10", "1000"), ("20", "2000"), ("70", "3000")]);
        let summary = summarize(&table).unwrap();

        let view: Vec<(&str, i64, usize)> = summary
            .rows
            .iter()
            .map(|r| (r.bucket.label(), r.sum, r.count))
            .collect();
        assert_eq!(view, vec![("1-14", 1000, 1), ("15-30", 2000, 1), ("60+", 3000, 1)]);
        assert_eq!(summary.grand_total, 6000);
        assert_eq!(summary.rows[0].ratio_percent(), 16.67);
    }

    #[test]
    fn test_zero_days_counts_toward_grand_total_only() {
        let table = overdue(&[("0", "4000"), ("5", "1000")]);
        let summary = summarize(&table).unwrap();

        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].count, 1);
        assert_eq!(summary.rows[0].sum, 1000);
        assert_eq!(summary.grand_total, 5000);
        assert!((summary.rows[0].ratio - 0.2).abs() < 1e-9);
        assert_eq!(summary.bucketed_rows, 1);
        assert_eq!(summary.source_rows, 2);
    }

    #[test]
    fn test_counts_never_exceed_source_rows() {
        let table = overdue(&[
            ("1", "10"),
            ("-1", "10"),
            ("x", "10"),
            ("45", "10"),
            ("45", "10"),
            ("100", ""),
        ]);
        let summary = summarize(&table).unwrap();
        let counted: usize = summary.rows.iter().map(|r| r.count).sum();
        assert!(counted <= table.len());
        assert_eq!(counted, 4);
    }

    #[test]
    fn test_formatted_amounts_sum_numerically() {
        let table = overdue(&[("3", "Rp1.500"), ("4", "2500")]);
        let summary = summarize(&table).unwrap();
        assert_eq!(summary.rows[0].sum, 4000);
    }

    #[test]
    fn test_no_bucketed_rows_is_empty_warning() {
        let table = overdue(&[("0", "100"), ("-5", "200")]);
        let err = summarize(&table).unwrap_err();
        assert!(matches!(err, ReportWarning::EmptyResult(_)));
    }

    #[test]
    fn test_missing_columns_warning() {
        let table = Table::from_rows(vec!["NAMA"], vec![vec![Cell::Missing]]).unwrap();
        let err = summarize(&table).unwrap_err();
        assert!(matches!(err, ReportWarning::MissingColumns(_)));
    }

    #[test]
    fn test_zero_grand_total_gives_zero_ratio() {
        let table = overdue(&[("3", "0")]);
        let summary = summarize(&table).unwrap();
        assert_eq!(summary.rows[0].ratio, 0.0);
    }

    #[test]
    fn test_summary_table() {
        let table = overdue(&[("10", "1000"), ("20", "2000"), ("70", "3000")]);
        let summary_table = summarize(&table).unwrap().to_table();

        assert_eq!(summary_table.column_names(), SUMMARY_COLUMNS.to_vec());
        assert_eq!(summary_table.len(), 3);
        let first = summary_table.row(0).unwrap();
        assert_eq!(first.get("TOTAL MTXVAL"), Some(&Cell::Integer(1000)));
        assert_eq!(first.get("TOTAL MTXVAL (Rp)"), Some(&Cell::Text("Rp1.000".into())));
        assert_eq!(first.get("RASIO (%)"), Some(&Cell::Decimal(16.67)));
    }
}
