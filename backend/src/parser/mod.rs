//! Loader: uploaded bytes to [`Table`].
//!
//! Two source kinds are supported, chosen by file name:
//!
//! - `.xlsx` workbooks: first worksheet, first row is the header, cells keep
//!   their native type.
//! - pipe-delimited text exports: charset auto-detection, first non-blank
//!   line is the header, lines with the wrong field count are skipped, every
//!   value is read as text.

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use crate::config::TEXT_DELIMITER;
use crate::error::{LoadError, LoadResult};
use crate::models::{Cell, FileKind, Table};

/// Metadata about a loaded source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub file_name: String,
    pub kind: FileKind,
    /// Detected charset (delimited text only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Field delimiter (delimited text only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    pub columns: Vec<String>,
    pub row_count: usize,
    /// Lines dropped because their field count did not match the header.
    pub skipped_lines: usize,
}

/// A parsed table with its source metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub table: Table,
    pub info: SourceInfo,
}

/// Result of parsing delimited text.
#[derive(Debug, Clone, PartialEq)]
pub struct DelimitedParse {
    pub table: Table,
    pub skipped_lines: usize,
}

/// Load an upload, choosing the parser from the declared file name.
pub fn load(file_name: &str, bytes: &[u8]) -> LoadResult<LoadedTable> {
    if bytes.is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let kind = FileKind::from_file_name(file_name);
    let (table, encoding, delimiter, skipped_lines) = match kind {
        FileKind::Spreadsheet => (load_spreadsheet(bytes)?, None, None, 0),
        FileKind::Delimited => {
            let encoding = detect_encoding(bytes);
            let content = decode_content(bytes, &encoding)?;
            let parsed = parse_delimited(&content, TEXT_DELIMITER)?;
            (
                parsed.table,
                Some(encoding),
                Some(TEXT_DELIMITER as char),
                parsed.skipped_lines,
            )
        }
    };

    let info = SourceInfo {
        file_name: file_name.to_string(),
        kind,
        encoding,
        delimiter,
        columns: table.column_names().into_iter().map(String::from).collect(),
        row_count: table.len(),
        skipped_lines,
    };

    Ok(LoadedTable { table, info })
}

/// Load a file from disk.
pub fn load_file<P: AsRef<Path>>(path: P) -> LoadResult<LoadedTable> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    load(name, &bytes)
}

// =============================================================================
// Delimited text
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string, failing on malformed input.
///
/// Unknown charset labels fall back to strict UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> LoadResult<String> {
    if bytes.contains(&0) {
        return Err(LoadError::Binary);
    }

    let codec = encoding_rs::Encoding::for_label(encoding.as_bytes()).unwrap_or(encoding_rs::UTF_8);
    let (text, used, had_errors) = codec.decode(bytes);
    if had_errors {
        return Err(LoadError::Encoding {
            encoding: used.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

/// Parse delimited text; every value is kept as text.
pub fn parse_delimited(content: &str, delimiter: u8) -> LoadResult<DelimitedParse> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    // Header is the first line with any content
    let headers = loop {
        match records.next() {
            None => return Err(LoadError::NoHeaders),
            Some(Err(e)) => return Err(LoadError::Delimited(e.to_string())),
            Some(Ok(record)) if is_blank(&record) => continue,
            Some(Ok(record)) => break unique_headers(record.iter().map(String::from)),
        }
    };

    let mut table = Table::new(headers)?;
    let mut skipped_lines = 0;

    for result in records {
        let record = match result {
            Ok(record) => record,
            Err(_) => {
                skipped_lines += 1;
                continue;
            }
        };
        // Whitespace-only lines carry no delimiter; rows of empty fields are kept
        if is_whitespace_line(&record, table.width()) {
            continue;
        }
        if record.len() != table.width() {
            skipped_lines += 1;
            continue;
        }
        table.push_row(record.iter().map(Cell::from_field).collect())?;
    }

    Ok(DelimitedParse {
        table,
        skipped_lines,
    })
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

fn is_whitespace_line(record: &csv::StringRecord, width: usize) -> bool {
    width > 1 && record.len() == 1 && is_blank(record)
}

// =============================================================================
// Spreadsheet
// =============================================================================

/// Parse the first worksheet of an `.xlsx` workbook.
pub fn load_spreadsheet(bytes: &[u8]) -> LoadResult<Table> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e: calamine::XlsxError| LoadError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)?
        .map_err(|e| LoadError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(LoadError::NoHeaders)?;
    let headers = unique_headers(header_row.iter().map(|c| c.to_string()));

    let mut table = Table::new(headers)?;
    for row in rows {
        table.push_row(row.iter().map(spreadsheet_cell).collect())?;
    }

    Ok(table)
}

/// Map a workbook cell to a table cell, keeping its native type.
fn spreadsheet_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Integer(*i),
        Data::Float(f) => float_cell(*f),
        Data::String(s) => Cell::from_field(s.trim()),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => Cell::Date(datetime.date()),
            None => float_cell(dt.as_f64()),
        },
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Missing,
    }
}

fn float_cell(f: f64) -> Cell {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Cell::Integer(f as i64)
    } else {
        Cell::Decimal(f)
    }
}

/// Trim header names, name blank ones and suffix duplicates with `.1`, `.2`...
fn unique_headers<I: IntoIterator<Item = String>>(raw: I) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let base = match name.trim() {
                "" => format!("Unnamed: {}", idx),
                trimmed => trimmed.to_string(),
            };
            let mut candidate = base.clone();
            let mut n = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}.{}", base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_simple_pipe_file() {
        let content = "NAMA|OVER DUE|MTXVAL\nToko A|10|1000\nToko B|20|2000";
        let parsed = parse_delimited(content, b'|').unwrap();

        assert_eq!(parsed.table.column_names(), vec!["NAMA", "OVER DUE", "MTXVAL"]);
        assert_eq!(parsed.table.len(), 2);
        assert_eq!(parsed.skipped_lines, 0);
        assert_eq!(parsed.table.row(1).unwrap().get("MTXVAL"), Some(&text("2000")));
    }

    #[test]
    fn test_row_count_is_lines_minus_header() {
        let lines: Vec<String> = std::iter::once("A|B".to_string())
            .chain((0..25).map(|i| format!("{}|{}", i, i * 2)))
            .collect();
        let parsed = parse_delimited(&lines.join("\n"), b'|').unwrap();
        assert_eq!(parsed.table.len(), lines.len() - 1);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let content = "A|B\n1|2\n3\n4|5\n6|7|8\n9|10";
        let parsed = parse_delimited(content, b'|').unwrap();

        // 6 lines, 1 header, 2 malformed
        assert_eq!(parsed.table.len(), 3);
        assert_eq!(parsed.skipped_lines, 2);
        assert_eq!(parsed.table.row(2).unwrap().get("A"), Some(&text("9")));
    }

    #[test]
    fn test_blank_lines_and_empty_fields() {
        let content = "\nA|B|C\n1||3\n\n4|5|6\n";
        let parsed = parse_delimited(content, b'|').unwrap();

        assert_eq!(parsed.table.len(), 2);
        assert_eq!(parsed.table.row(0).unwrap().get("B"), Some(&Cell::Missing));
    }

    #[test]
    fn test_all_empty_fields_kept_as_row() {
        let content = "A|B|C\n1|2|3\n||\n4|5|6";
        let parsed = parse_delimited(content, b'|').unwrap();

        assert_eq!(parsed.table.len(), 3);
        assert_eq!(parsed.skipped_lines, 0);
        let middle = parsed.table.row(1).unwrap();
        assert!(middle.cells().all(Cell::is_missing));
    }

    #[test]
    fn test_whitespace_only_line_ignored() {
        let parsed = parse_delimited("A|B\n1|2\n   \n3|4", b'|').unwrap();
        assert_eq!(parsed.table.len(), 2);
        assert_eq!(parsed.skipped_lines, 0);
    }

    #[test]
    fn test_values_trimmed_and_unquoted() {
        let content = "A | B\n\"x|y\"| 2 ";
        let parsed = parse_delimited(content, b'|').unwrap();

        assert_eq!(parsed.table.column_names(), vec!["A", "B"]);
        assert_eq!(parsed.table.row(0).unwrap().get("A"), Some(&text("x|y")));
        assert_eq!(parsed.table.row(0).unwrap().get("B"), Some(&text("2")));
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let parsed = parse_delimited("A||A\n1|2|3", b'|').unwrap();
        assert_eq!(parsed.table.column_names(), vec!["A", "Unnamed: 1", "A.1"]);
    }

    #[test]
    fn test_header_only_file() {
        let parsed = parse_delimited("A|B\n", b'|').unwrap();
        assert!(parsed.table.is_empty());
        assert_eq!(parsed.table.width(), 2);
    }

    #[test]
    fn test_empty_input_errors() {
        assert!(matches!(load("x.txt", b""), Err(LoadError::EmptyFile)));
        assert!(matches!(parse_delimited("\n\n", b'|'), Err(LoadError::NoHeaders)));
    }

    #[test]
    fn test_binary_content_rejected() {
        let bytes = [0x50, 0x4B, 0x03, 0x04, 0x00, 0x00, 0xFF];
        assert!(matches!(load("upload.txt", &bytes), Err(LoadError::Binary)));
    }

    #[test]
    fn test_corrupt_spreadsheet_is_load_error() {
        let err = load("upload.xlsx", b"definitely not a zip").unwrap_err();
        assert!(matches!(err, LoadError::Spreadsheet(_)));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let bytes: &[u8] = &[0x41, 0xC3, 0x28, 0x42];
        let err = decode_content(bytes, "utf-8").unwrap_err();
        assert!(matches!(err, LoadError::Encoding { .. }));
    }

    #[test]
    fn test_load_reports_metadata() {
        let content = "A|B\n1|2\nbad\n3|4";
        let loaded = load("overdue.txt", content.as_bytes()).unwrap();

        assert_eq!(loaded.info.kind, FileKind::Delimited);
        assert_eq!(loaded.info.encoding.as_deref(), Some("utf-8"));
        assert_eq!(loaded.info.delimiter, Some('|'));
        assert_eq!(loaded.info.row_count, 2);
        assert_eq!(loaded.info.skipped_lines, 1);
        assert_eq!(loaded.info.columns, vec!["A", "B"]);
    }

    #[test]
    fn test_load_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("piutang.txt");
        std::fs::write(&path, "A|B\n1|2").unwrap();

        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.info.file_name, "piutang.txt");
        assert_eq!(loaded.table.len(), 1);
    }

    #[test]
    fn test_spreadsheet_native_types() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "NAMA").unwrap();
        sheet.write_string(0, 1, "OVER DUE").unwrap();
        sheet.write_string(0, 2, "RATE").unwrap();
        sheet.write_string(1, 0, "Toko A").unwrap();
        sheet.write_number(1, 1, 12.0).unwrap();
        sheet.write_number(1, 2, 0.5).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let loaded = load("overdue.xlsx", &bytes).unwrap();
        assert_eq!(loaded.info.kind, FileKind::Spreadsheet);
        assert_eq!(loaded.info.encoding, None);

        let row = loaded.table.row(0).unwrap();
        assert_eq!(row.get("NAMA"), Some(&text("Toko A")));
        assert_eq!(row.get("OVER DUE"), Some(&Cell::Integer(12)));
        assert_eq!(row.get("RATE"), Some(&Cell::Decimal(0.5)));
    }
}
