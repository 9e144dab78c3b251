//! Chart specifications.
//!
//! A `ChartSpec` describes one dashboard tile: which field(s) to group by,
//! how to bucket dates and a few display hints. Specs are edited one at a
//! time through the chart store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::bucket::Granularity;
use crate::error::ValidationError;
use crate::record::Field;
use crate::storage::Keyed;

/// Rendering type of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Line,
    Column,
    Pie,
    Area,
    Spline,
}

impl ChartType {
    pub const ALL: [Self; 6] = [
        Self::Bar,
        Self::Line,
        Self::Column,
        Self::Pie,
        Self::Area,
        Self::Spline,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Column => "column",
            Self::Pie => "pie",
            Self::Area => "area",
            Self::Spline => "spline",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| ValidationError::UnknownChartType { name: s.to_string() })
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// User-configurable description of one chart tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Store key; `0` asks the store to assign one on upsert.
    pub id: i64,

    pub title: String,

    #[serde(default)]
    pub subtitle: Option<String>,

    #[serde(rename = "type")]
    pub chart_type: ChartType,

    /// One or two fields. The first is the category axis, the second splits
    /// the data into series.
    #[serde(alias = "axises")]
    pub axes: Vec<Field>,

    /// Date granularity, used only when a cross-tab axis is temporal.
    #[serde(default, rename = "countBy", alias = "countby", alias = "count_by")]
    pub count_by: Option<Granularity>,

    /// Spans two columns on wide layouts.
    #[serde(default, deserialize_with = "null_as_false")]
    pub wide: bool,

    /// Spans two rows.
    #[serde(default, deserialize_with = "null_as_false")]
    pub tall: bool,

    /// Palette name; `None` or `"default"` keeps the renderer palette.
    #[serde(default)]
    pub colors: Option<String>,
}

impl ChartSpec {
    /// Creates a spec with no id assigned yet.
    #[must_use]
    pub fn new(title: impl Into<String>, chart_type: ChartType, axes: Vec<Field>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            subtitle: None,
            chart_type,
            axes,
            count_by: None,
            wide: false,
            tall: false,
            colors: None,
        }
    }

    #[must_use]
    pub const fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    #[must_use]
    pub const fn with_count_by(mut self, granularity: Granularity) -> Self {
        self.count_by = Some(granularity);
        self
    }

    #[must_use]
    pub fn with_colors(mut self, palette: impl Into<String>) -> Self {
        self.colors = Some(palette.into());
        self
    }

    #[must_use]
    pub const fn wide(mut self) -> Self {
        self.wide = true;
        self
    }

    #[must_use]
    pub const fn tall(mut self) -> Self {
        self.tall = true;
        self
    }

    /// True if any axis is the temporal field.
    #[must_use]
    pub fn has_temporal_axis(&self) -> bool {
        self.axes.iter().any(|f| f.is_temporal())
    }

    /// The charts every new session starts with.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(
                "Default Chart",
                ChartType::Spline,
                vec![Field::Birthdate, Field::BloodGroup],
            )
            .with_id(1)
            .with_subtitle("Default Chart")
            .with_count_by(Granularity::Decades)
            .wide(),
            Self::new(
                "Gender Chart",
                ChartType::Column,
                vec![Field::Birthdate, Field::Sex],
            )
            .with_id(3)
            .with_count_by(Granularity::Decades),
            Self::new(
                "Blood Group Chart",
                ChartType::Pie,
                vec![Field::Birthdate, Field::BloodGroup],
            )
            .with_id(2)
            .with_count_by(Granularity::ForAllTime),
            Self::new("Job Chart", ChartType::Bar, vec![Field::Birthdate, Field::Job])
                .with_id(4)
                .with_count_by(Granularity::ForAllTime)
                .wide()
                .tall(),
        ]
    }
}

impl Keyed for ChartSpec {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn normalize(self) -> Result<Self, ValidationError> {
        if !(1..=2).contains(&self.axes.len()) {
            return Err(ValidationError::InvalidAxisCount {
                chart_id: self.id,
                count: self.axes.len(),
            });
        }
        Ok(self)
    }
}
