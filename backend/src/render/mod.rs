//! Renderer: read-only outputs built from tables and summaries.
//!
//! - [`chart`]: plotly-shaped chart description of the overdue summary
//! - [`export`]: `.xlsx` serialization of any table

pub mod chart;
pub mod export;

pub use chart::{overdue_chart, ChartSpec, Trace};
pub use export::table_to_xlsx;
