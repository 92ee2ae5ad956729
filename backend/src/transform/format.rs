//! Formatter ("Data Rapi"): per-column display rules.
//!
//! Rules are applied by column name; rules whose column is absent are
//! skipped. A cell that a rule cannot parse gets the rule's sentinel (`Rp0`
//! for currency, blank for dates) and is reported as a [`FormatError`].

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{AMOUNT_COLUMN, DUE_DATE_COLUMN, INVOICE_DATE_COLUMN};
use crate::error::FormatError;
use crate::models::{Cell, Table, DISPLAY_DATE_FORMAT};

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").expect("valid regex"));

/// A display rule for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormatRule {
    /// Digits only, rendered as `Rp` with `.` thousands separators.
    Currency,
    /// `YYYYMMDD` rendered as `DD-MM-YYYY`.
    Date,
}

impl FormatRule {
    pub fn name(&self) -> &'static str {
        match self {
            FormatRule::Currency => "currency",
            FormatRule::Date => "date",
        }
    }

    /// Apply this rule to a cell.
    ///
    /// `Err` carries the sentinel cell to use instead.
    pub fn apply(&self, cell: &Cell) -> Result<Cell, Cell> {
        match self {
            FormatRule::Currency => match cell {
                Cell::Missing => Ok(Cell::Text(format_rupiah(0))),
                _ => amount_of(cell)
                    .map(|amount| Cell::Text(format_rupiah(amount)))
                    .ok_or_else(|| Cell::Text(format_rupiah(0))),
            },
            FormatRule::Date => match cell {
                Cell::Missing => Ok(Cell::Missing),
                _ => parse_compact_date(cell)
                    .map(|date| Cell::Text(date.format(DISPLAY_DATE_FORMAT).to_string()))
                    .ok_or(Cell::Missing),
            },
        }
    }
}

/// Ordered column-name → rule pairs.
pub type RuleSet = Vec<(String, FormatRule)>;

/// The "Data Rapi" rules for overdue listings.
pub fn tidy_rules() -> RuleSet {
    vec![
        (AMOUNT_COLUMN.to_string(), FormatRule::Currency),
        (INVOICE_DATE_COLUMN.to_string(), FormatRule::Date),
        (DUE_DATE_COLUMN.to_string(), FormatRule::Date),
    ]
}

/// A formatted table plus every cell that fell back to a sentinel.
#[derive(Debug, Clone)]
pub struct FormatOutcome {
    pub table: Table,
    pub errors: Vec<FormatError>,
}

/// Apply `rules` to a copy of `table`.
///
/// Column order and untouched columns are preserved.
pub fn apply_rules(table: &Table, rules: &[(String, FormatRule)]) -> FormatOutcome {
    let mut formatted = table.clone();
    let mut errors = Vec::new();

    for (name, rule) in rules {
        let Some(column) = table.column(name) else {
            continue;
        };

        let cells = column
            .cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                rule.apply(cell).unwrap_or_else(|sentinel| {
                    errors.push(FormatError {
                        column: name.clone(),
                        row,
                        value: cell.to_string(),
                        rule: rule.name(),
                    });
                    sentinel
                })
            })
            .collect();

        let replaced = formatted.set_column(name, cells);
        debug_assert!(replaced.is_ok(), "formatted column keeps its length");
    }

    FormatOutcome {
        table: formatted,
        errors,
    }
}

/// Numeric amount of a monetary cell.
///
/// Text keeps only its ASCII digits (`"Rp12.500"` → 12500); numbers are used
/// directly, decimals rounded. `None` when nothing parseable remains.
pub fn amount_of(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Text(s) => NON_DIGITS.replace_all(s, "").parse::<i64>().ok(),
        Cell::Integer(i) => Some(*i),
        Cell::Decimal(d) if d.is_finite() && d.abs() < i64::MAX as f64 => Some(d.round() as i64),
        _ => None,
    }
}

/// `12500` → `"Rp12.500"`.
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("Rp{}{}", sign, grouped)
}

/// Parse an 8-digit `YYYYMMDD` value; date cells pass through.
pub fn parse_compact_date(cell: &Cell) -> Option<NaiveDate> {
    let raw = match cell {
        Cell::Date(d) => return Some(*d),
        Cell::Text(s) => s.trim().to_string(),
        Cell::Integer(i) => i.to_string(),
        Cell::Decimal(d) if d.fract() == 0.0 => format!("{:.0}", d),
        _ => return None,
    };
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(&raw, "%Y%m%d").ok()
}
