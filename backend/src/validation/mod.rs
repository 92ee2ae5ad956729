//! Column presence checks.
//!
//! Stages that need specific columns check for them once, at entry, and get
//! back a typed capability holding the resolved column positions. Missing
//! columns are reported all at once as a [`MissingColumnError`].
//!
//! # Example
//!
//! ```rust,ignore
//! use aos_dashboard::validation::OverdueColumns;
//!
//! match OverdueColumns::check(&table) {
//!     Ok(cols) => println!("row 0 is {:?} days overdue", cols.days(0)),
//!     Err(missing) => eprintln!("cannot bucket: {}", missing),
//! }
//! ```

use crate::config::{AMOUNT_COLUMN, CATEGORY_COLUMN, OVERDUE_COLUMN};
use crate::error::MissingColumnError;
use crate::models::{Cell, OverdueBucket, Table};
use crate::transform::format::amount_of;

/// Positions of a set of required columns in one table.
#[derive(Debug, Clone, Copy)]
pub struct RequiredColumns<'a, const N: usize> {
    table: &'a Table,
    indices: [usize; N],
}

impl<'a, const N: usize> RequiredColumns<'a, N> {
    pub fn table(&self) -> &'a Table {
        self.table
    }

    /// Cell of the `slot`-th required column at `row`.
    pub fn cell(&self, slot: usize, row: usize) -> &'a Cell {
        &self.table.columns()[self.indices[slot]].cells[row]
    }
}

/// Check that every name is a column of `table`.
pub fn require_columns<'a, const N: usize>(
    table: &'a Table,
    names: [&str; N],
) -> Result<RequiredColumns<'a, N>, MissingColumnError> {
    let mut indices = [0; N];
    let mut missing = Vec::new();

    for (slot, name) in names.iter().enumerate() {
        match table.column_index(name) {
            Some(idx) => indices[slot] = idx,
            None => missing.push(name.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(RequiredColumns { table, indices })
    } else {
        Err(MissingColumnError { columns: missing })
    }
}

/// Capability: the table has `OVER DUE` and `MTXVAL`.
#[derive(Debug, Clone, Copy)]
pub struct OverdueColumns<'a>(RequiredColumns<'a, 2>);

impl<'a> OverdueColumns<'a> {
    pub fn check(table: &'a Table) -> Result<Self, MissingColumnError> {
        require_columns(table, [OVERDUE_COLUMN, AMOUNT_COLUMN]).map(Self)
    }

    pub fn table(&self) -> &'a Table {
        self.0.table()
    }

    /// Days overdue at `row`, if numeric.
    pub fn days(&self, row: usize) -> Option<f64> {
        self.0.cell(0, row).as_number()
    }

    /// Monetary amount at `row`; unreadable amounts count as zero.
    pub fn amount(&self, row: usize) -> i64 {
        amount_of(self.0.cell(1, row)).unwrap_or(0)
    }
}

/// Capability: the table has been categorized and has `MTXVAL`.
#[derive(Debug, Clone, Copy)]
pub struct CategorizedColumns<'a>(RequiredColumns<'a, 2>);

impl<'a> CategorizedColumns<'a> {
    pub fn check(table: &'a Table) -> Result<Self, MissingColumnError> {
        require_columns(table, [CATEGORY_COLUMN, AMOUNT_COLUMN]).map(Self)
    }

    pub fn table(&self) -> &'a Table {
        self.0.table()
    }

    pub fn bucket(&self, row: usize) -> Option<OverdueBucket> {
        self.0.cell(0, row).as_text().and_then(OverdueBucket::from_label)
    }

    /// Monetary amount at `row`; unreadable amounts count as zero.
    pub fn amount(&self, row: usize) -> i64 {
        amount_of(self.0.cell(1, row)).unwrap_or(0)
    }
}
