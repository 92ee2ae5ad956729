//! Transformation module.
//!
//! This module turns a loaded table into report outputs:
//! - Format: "Data Rapi" currency and date rules
//! - Categorize: overdue bucket per row
//! - Aggregate: per-bucket sums, counts and ratios
//! - Pipeline: options-driven report for one file

pub mod aggregate;
pub mod categorize;
pub mod format;
pub mod pipeline;

pub use aggregate::{aggregate, summarize, Summary};
pub use categorize::categorize;
pub use format::{amount_of, apply_rules, format_rupiah, tidy_rules, FormatRule};
pub use pipeline::*;
