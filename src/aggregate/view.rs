//! Render-ready chart output.

use serde::{Deserialize, Serialize};

use crate::bucket::Category;
use crate::chart::ChartType;
use crate::record::Field;

/// One named count in a single-series chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub name: Category,
    pub count: u64,
}

/// Series payload: plain counts aligned with the category axis, or named points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesData {
    Counts(Vec<u64>),
    Points(Vec<Point>),
}

impl SeriesData {
    /// Sum of all counts in the series.
    #[must_use]
    pub fn total(&self) -> u64 {
        match self {
            Self::Counts(c) => c.iter().sum(),
            Self::Points(p) => p.iter().map(|pt| pt.count).sum(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Counts(c) => c.len(),
            Self::Points(p) => p.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A data series ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub data: SeriesData,
}

/// Axis title plus, for the category axis, its ordered categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,
}

/// How a chart's records were grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ChartMode {
    /// One series counting each distinct value of `key`.
    Simple { key: Field },
    /// One series per `chart` point, counted against `compared` categories.
    CrossTab { compared: Field, chart: Field },
}

/// Everything the presentation layer needs for one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartView {
    pub chart_id: i64,
    pub title: String,
    pub subtitle: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub mode: Option<ChartMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<Axis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<Axis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    pub series: Vec<Series>,
    /// Number of records the chart was computed over.
    pub record_count: usize,
}

impl ChartView {
    /// False when the chart produced no series and should stay blank.
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        !self.series.is_empty()
    }

    /// Ordered category-axis values.
    #[must_use]
    pub fn abscissa(&self) -> &[Category] {
        self.x_axis.as_ref().map_or(&[], |a| a.categories.as_slice())
    }
}
