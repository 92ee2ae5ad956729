//! In-memory table: ordered named columns of equal length.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::Cell;
use crate::error::TableError;

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }
}

/// Ordered columns, all of the same length.
///
/// Row order is the insertion order from the source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Empty table with the given headers and no rows.
    pub fn new<I, S>(headers: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Table::default();
        for name in headers {
            table.push_column(Column::new(name, Vec::new()))?;
        }
        Ok(table)
    }

    /// Build a table from headers and row-major cells.
    pub fn from_rows<S: Into<String>>(
        headers: Vec<S>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self, TableError> {
        let mut table = Table::new(headers)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append one row; it must have one cell per column.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        for (column, cell) in self.columns.iter_mut().zip(row) {
            column.cells.push(cell);
        }
        self.rows += 1;
        Ok(())
    }

    /// Append a column; its length must match the row count.
    ///
    /// The first column of an empty table sets the row count.
    pub fn push_column(&mut self, column: Column) -> Result<(), TableError> {
        if self.column_index(&column.name).is_some() {
            return Err(TableError::DuplicateColumn(column.name));
        }
        if self.columns.is_empty() {
            self.rows = column.cells.len();
        } else if column.cells.len() != self.rows {
            return Err(TableError::ColumnLength {
                column: column.name,
                expected: self.rows,
                found: column.cells.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Replace the cells of an existing column, keeping its position.
    ///
    /// Appends the column when it does not exist yet.
    pub fn set_column(&mut self, name: &str, cells: Vec<Cell>) -> Result<(), TableError> {
        match self.column_index(name) {
            Some(idx) => {
                if cells.len() != self.rows {
                    return Err(TableError::ColumnLength {
                        column: name.to_string(),
                        expected: self.rows,
                        found: cells.len(),
                    });
                }
                self.columns[idx].cells = cells;
                Ok(())
            }
            None => self.push_column(Column::new(name, cells)),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|idx| &self.columns[idx])
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.rows).then_some(Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        (0..self.rows).map(move |index| Row { table: self, index })
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell at a column position.
    pub fn cell(&self, column: usize) -> Option<&'a Cell> {
        self.table.columns.get(column).map(|c| &c.cells[self.index])
    }

    /// Cell under a column name.
    pub fn get(&self, name: &str) -> Option<&'a Cell> {
        self.table.column(name).map(|c| &c.cells[self.index])
    }

    pub fn cells(&self) -> impl Iterator<Item = &'a Cell> + 'a {
        let index = self.index;
        self.table.columns.iter().map(move |c| &c.cells[index])
    }
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.cells())
    }
}

/// Serialized as `{ "columns": [...], "rows": [[...], ...] }`.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<Row<'_>> = self.rows().collect();
        let mut state = serializer.serialize_struct("Table", 2)?;
        state.serialize_field("columns", &self.column_names())?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}
