//! Chart description for the overdue summary.
//!
//! The description follows the plotly figure layout (`data` traces plus a
//! `layout`), so a display collaborator can hand it to plotly.js unchanged:
//! a bar trace of monetary sums on the primary axis and a line+marker trace
//! of row counts on a secondary axis on the right.

use serde::Serialize;

use crate::error::EmptyResultWarning;
use crate::models::AggregateRow;
use crate::transform::format::format_rupiah;

pub const CHART_TITLE: &str = "Grafik Piutang Overdue";
pub const X_AXIS_TITLE: &str = "Kategori Over Due";
pub const SUM_SERIES_NAME: &str = "Total Nominal (Rp)";
pub const COUNT_SERIES_NAME: &str = "Count";

/// A complete figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl ChartSpec {
    /// Category axis values, taken from the first trace.
    pub fn categories(&self) -> Vec<&str> {
        match self.data.first() {
            Some(Trace::Bar { x, .. }) | Some(Trace::Scatter { x, .. }) => {
                x.iter().map(String::as_str).collect()
            }
            None => Vec::new(),
        }
    }
}

/// One series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Bar {
        name: String,
        x: Vec<String>,
        y: Vec<i64>,
        /// Per-bar annotation.
        text: Vec<String>,
        textposition: String,
        yaxis: String,
    },
    Scatter {
        name: String,
        x: Vec<String>,
        y: Vec<usize>,
        mode: String,
        yaxis: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub yaxis2: Axis,
    pub legend: Legend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titlefont: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
}

impl Axis {
    fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            titlefont: None,
            overlaying: None,
            side: None,
        }
    }

    fn colored(mut self, color: &str) -> Self {
        self.titlefont = Some(Font {
            color: color.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub orientation: String,
    pub yanchor: String,
    pub y: f64,
    pub xanchor: String,
    pub x: f64,
}

/// Bar annotation: `"Rp1.000 (1)"`.
pub fn bar_label(row: &AggregateRow) -> String {
    format!("{} ({})", format_rupiah(row.sum), row.count)
}

/// Build the overdue chart from populated buckets.
pub fn overdue_chart(rows: &[AggregateRow]) -> Result<ChartSpec, EmptyResultWarning> {
    if rows.is_empty() {
        return Err(EmptyResultWarning::new("overdue chart"));
    }

    let categories: Vec<String> = rows.iter().map(|r| r.bucket.label().to_string()).collect();

    let bars = Trace::Bar {
        name: SUM_SERIES_NAME.to_string(),
        x: categories.clone(),
        y: rows.iter().map(|r| r.sum).collect(),
        text: rows.iter().map(bar_label).collect(),
        textposition: "auto".to_string(),
        yaxis: "y".to_string(),
    };

    let counts = Trace::Scatter {
        name: COUNT_SERIES_NAME.to_string(),
        x: categories,
        y: rows.iter().map(|r| r.count).collect(),
        mode: "lines+markers".to_string(),
        yaxis: "y2".to_string(),
    };

    let mut secondary = Axis::titled(COUNT_SERIES_NAME).colored("orange");
    secondary.overlaying = Some("y".to_string());
    secondary.side = Some("right".to_string());

    Ok(ChartSpec {
        data: vec![bars, counts],
        layout: Layout {
            title: CHART_TITLE.to_string(),
            xaxis: Axis::titled(X_AXIS_TITLE),
            yaxis: Axis::titled(SUM_SERIES_NAME).colored("blue"),
            yaxis2: secondary,
            legend: Legend {
                orientation: "h".to_string(),
                yanchor: "bottom".to_string(),
                y: 1.02,
                xanchor: "center".to_string(),
                x: 0.5,
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OverdueBucket;

    fn rows() -> Vec<AggregateRow> {
        vec![
            AggregateRow { bucket: OverdueBucket::UpTo14, sum: 1000, count: 1, ratio: 1.0 / 6.0 },
            AggregateRow { bucket: OverdueBucket::Over60, sum: 5000, count: 2, ratio: 5.0 / 6.0 },
        ]
    }

    #[test]
    fn test_chart_series() {
        let chart = overdue_chart(&rows()).unwrap();
        assert_eq!(chart.categories(), vec!["1-14", "60+"]);

        match &chart.data[0] {
            Trace::Bar { y, text, yaxis, .. } => {
                assert_eq!(y, &vec![1000, 5000]);
                assert_eq!(text, &vec!["Rp1.000 (1)".to_string(), "Rp5.000 (2)".to_string()]);
                assert_eq!(yaxis, "y");
            }
            other => panic!("expected bar trace, got {:?}", other),
        }
        match &chart.data[1] {
            Trace::Scatter { y, mode, yaxis, .. } => {
                assert_eq!(y, &vec![1, 2]);
                assert_eq!(mode, "lines+markers");
                assert_eq!(yaxis, "y2");
            }
            other => panic!("expected scatter trace, got {:?}", other),
        }
    }

    #[test]
    fn test_chart_json_layout() {
        let json = serde_json::to_value(overdue_chart(&rows()).unwrap()).unwrap();
        assert_eq!(json["data"][0]["type"], "bar");
        assert_eq!(json["data"][1]["type"], "scatter");
        assert_eq!(json["layout"]["xaxis"]["title"], X_AXIS_TITLE);
        assert_eq!(json["layout"]["yaxis2"]["overlaying"], "y");
        assert_eq!(json["layout"]["yaxis2"]["side"], "right");
        assert_eq!(json["layout"]["legend"]["orientation"], "h");
        assert!(json["layout"]["xaxis"].get("side").is_none());
    }

    #[test]
    fn test_empty_chart_is_warning() {
        let err = overdue_chart(&[]).unwrap_err();
        assert_eq!(err.step, "overdue chart");
    }
}
