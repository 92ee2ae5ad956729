//! Spreadsheet export: a table to `.xlsx` bytes.
//!
//! One worksheet named `Sheet1`: a bold header row, then one row per record
//! in table order. Text stays text, numbers stay numbers, dates are written
//! as dates with a `dd-mm-yyyy` format and missing cells are left blank.

use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};

use crate::config::EXPORT_SHEET_NAME;
use crate::error::{EmptyResultWarning, ExportResult};
use crate::models::{Cell, Table};

/// Reusable cell formats.
struct ExportFormats {
    header: Format,
    date: Format,
}

impl ExportFormats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            date: Format::new().set_num_format("dd-mm-yyyy"),
        }
    }
}

/// Serialize `table` into an in-memory workbook.
///
/// A table without rows yields an [`EmptyResultWarning`] instead of a file.
pub fn table_to_xlsx(table: &Table) -> ExportResult<Vec<u8>> {
    if table.is_empty() {
        return Err(EmptyResultWarning::new("spreadsheet export").into());
    }

    let formats = ExportFormats::new();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, name) in table.column_names().into_iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &formats.header)?;
    }

    for row in table.rows() {
        let excel_row = row.index() as u32 + 1;
        for (col, cell) in row.cells().enumerate() {
            write_cell(sheet, excel_row, col as u16, cell, &formats)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    formats: &ExportFormats,
) -> ExportResult<()> {
    match cell {
        Cell::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
        Cell::Integer(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        Cell::Decimal(d) => {
            sheet.write_number(row, col, *d)?;
        }
        Cell::Date(date) => match excel_date(date) {
            Some(datetime) => {
                sheet.write_datetime_with_format(row, col, &datetime, &formats.date)?;
            }
            // Outside Excel's 1900-9999 calendar, keep the display text
            None => {
                sheet.write_string(row, col, cell.to_string())?;
            }
        },
        Cell::Missing => {}
    }
    Ok(())
}

fn excel_date(date: &NaiveDate) -> Option<ExcelDateTime> {
    let year = u16::try_from(date.year()).ok()?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::parser::load;

    fn sample() -> Table {
        Table::from_rows(
            vec!["NAMA", "MTXVAL", "RATE", "TGL INVOICE", "CATATAN"],
            vec![
                vec![
                    Cell::Text("Toko A".into()),
                    Cell::Text("Rp1.000".into()),
                    Cell::Decimal(0.25),
                    Cell::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()),
                    Cell::Missing,
                ],
                vec![
                    Cell::Text("Toko B".into()),
                    Cell::Integer(2000),
                    Cell::Missing,
                    Cell::Missing,
                    Cell::Text("lunas".into()),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_export_then_load_keeps_shape() {
        let table = sample();
        let bytes = table_to_xlsx(&table).unwrap();
        let reloaded = load("export.xlsx", &bytes).unwrap().table;

        assert_eq!(reloaded.column_names(), table.column_names());
        assert_eq!(reloaded.len(), table.len());
    }

    #[test]
    fn test_export_keeps_cell_types() {
        let bytes = table_to_xlsx(&sample()).unwrap();
        let reloaded = load("export.xlsx", &bytes).unwrap().table;

        let first = reloaded.row(0).unwrap();
        assert_eq!(first.get("MTXVAL"), Some(&Cell::Text("Rp1.000".into())));
        assert_eq!(first.get("RATE"), Some(&Cell::Decimal(0.25)));
        assert_eq!(
            first.get("TGL INVOICE"),
            Some(&Cell::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()))
        );
        assert_eq!(first.get("CATATAN"), Some(&Cell::Missing));

        let second = reloaded.row(1).unwrap();
        assert_eq!(second.get("MTXVAL"), Some(&Cell::Integer(2000)));
    }

    #[test]
    fn test_dates_outside_excel_calendar_kept_as_text() {
        let placeholder = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
        let far = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
        let table = Table::from_rows(
            vec!["TGL INVOICE"],
            vec![vec![Cell::Date(placeholder)], vec![Cell::Date(far)]],
        )
        .unwrap();

        let bytes = table_to_xlsx(&table).unwrap();
        let reloaded = load("export.xlsx", &bytes).unwrap().table;
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.row(0).unwrap().get("TGL INVOICE"),
            Some(&Cell::Text("31-12-1899".into()))
        );
        assert_eq!(
            reloaded.row(1).unwrap().get("TGL INVOICE"),
            Some(&Cell::Text(Cell::Date(far).to_string()))
        );
    }

    #[test]
    fn test_empty_table_not_exported() {
        let table = Table::new(vec!["A"]).unwrap();
        let err = table_to_xlsx(&table).unwrap_err();
        assert!(matches!(err, ExportError::Empty(_)));
    }
}
