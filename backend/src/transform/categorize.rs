//! Categorizer: derive the overdue bucket of every row.

use crate::config::CATEGORY_COLUMN;
use crate::error::MissingColumnError;
use crate::models::{Cell, OverdueBucket, Table};
use crate::validation::OverdueColumns;

/// Bucket of each row, in row order.
pub fn buckets(columns: &OverdueColumns<'_>) -> Vec<Option<OverdueBucket>> {
    (0..columns.table().len())
        .map(|row| columns.days(row).and_then(OverdueBucket::from_days))
        .collect()
}

/// Copy of `table` with the `KATEGORI OVER DUE` column set.
///
/// Rows with zero, negative or non-numeric day-counts get a missing cell.
/// Re-categorizing replaces the existing category column.
pub fn categorize(table: &Table) -> Result<Table, MissingColumnError> {
    let columns = OverdueColumns::check(table)?;

    let cells = buckets(&columns)
        .into_iter()
        .map(|bucket| match bucket {
            Some(b) => Cell::Text(b.label().to_string()),
            None => Cell::Missing,
        })
        .collect();

    let mut categorized = table.clone();
    let added = categorized.set_column(CATEGORY_COLUMN, cells);
    debug_assert!(added.is_ok(), "category column has one cell per row");
    Ok(categorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overdue_table(days: &[&str]) -> Table {
        let rows = days
            .iter()
            .map(|d| vec![Cell::from_field(d), Cell::Text("1000".into())])
            .collect();
        Table::from_rows(vec!["OVER DUE", "MTXVAL"], rows).unwrap()
    }

    fn labels(table: &Table) -> Vec<Option<String>> {
        table
            .column(CATEGORY_COLUMN)
            .unwrap()
            .cells
            .iter()
            .map(|c| c.as_text().map(String::from))
            .collect()
    }

    #[test]
    fn test_boundaries() {
        let table = overdue_table(&["0", "14", "15", "30", "31", "60", "61", "-2"]);
        let categorized = categorize(&table).unwrap();

        assert_eq!(
            labels(&categorized),
            vec![
                None,
                Some("1-14".into()),
                Some("15-30".into()),
                Some("15-30".into()),
                Some("31-60".into()),
                Some("31-60".into()),
                Some("60+".into()),
                None,
            ]
        );
    }

    #[test]
    fn test_non_numeric_and_missing_unbucketed() {
        let table = overdue_table(&["abc", "", " 7 "]);
        let categorized = categorize(&table).unwrap();
        assert_eq!(labels(&categorized), vec![None, None, Some("1-14".into())]);
    }

    #[test]
    fn test_column_appended_last() {
        let table = overdue_table(&["5"]);
        let categorized = categorize(&table).unwrap();
        assert_eq!(categorized.column_names(), vec!["OVER DUE", "MTXVAL", CATEGORY_COLUMN]);

        // Running twice does not add a second column
        let again = categorize(&categorized).unwrap();
        assert_eq!(again.width(), 3);
    }

    #[test]
    fn test_missing_columns() {
        let table = Table::from_rows(vec!["OVER DUE"], vec![vec![Cell::Integer(3)]]).unwrap();
        let err = categorize(&table).unwrap_err();
        assert_eq!(err.columns, vec!["MTXVAL"]);
    }
}
