//! Date bucketing.
//!
//! A granularity maps to a `BucketSpec`, which labels dates and tests whether
//! a date belongs to a label. Days, months and years label each date
//! directly. Decades and centuries are range buckets: labels are aligned
//! start years generated from the span of the dates being charted.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{BucketError, ValidationError};
use crate::time::year_start;

/// Years per decade bucket.
pub const DECADE: i32 = 10;
/// Years per century bucket.
pub const CENTURY: i32 = 100;

/// How a temporal axis is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    Days,
    Months,
    Years,
    Decades,
    Centuries,
    /// The axis is not split by time at all.
    #[serde(alias = "for all time")]
    ForAllTime,
    /// Reserved; has no bucketing rule.
    Dynamic,
}

impl Granularity {
    pub const ALL: [Self; 7] = [
        Self::Days,
        Self::Months,
        Self::Years,
        Self::Decades,
        Self::Centuries,
        Self::ForAllTime,
        Self::Dynamic,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Months => "months",
            Self::Years => "years",
            Self::Decades => "decades",
            Self::Centuries => "centuries",
            Self::ForAllTime => "for-all-time",
            Self::Dynamic => "dynamic",
        }
    }

    /// Resolves the bucketing rule for this granularity.
    ///
    /// Returns `Ok(None)` for `ForAllTime`, where the temporal field only
    /// filters and never splits an axis.
    ///
    /// # Errors
    ///
    /// `Dynamic` has no rule and fails with
    /// `BucketError::UnsupportedGranularity`.
    pub const fn bucket_spec(self) -> Result<Option<BucketSpec>, BucketError> {
        match self {
            Self::Days => Ok(Some(BucketSpec::Day)),
            Self::Months => Ok(Some(BucketSpec::Month)),
            Self::Years => Ok(Some(BucketSpec::Year)),
            Self::Decades => Ok(Some(BucketSpec::Range {
                granularity: Self::Decades,
                span: DECADE,
            })),
            Self::Centuries => Ok(Some(BucketSpec::Range {
                granularity: Self::Centuries,
                span: CENTURY,
            })),
            Self::ForAllTime => Ok(None),
            Self::Dynamic => Err(BucketError::UnsupportedGranularity {
                granularity: self.as_str(),
            }),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        if key == "for all time" {
            return Ok(Self::ForAllTime);
        }
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == key)
            .ok_or_else(|| ValidationError::UnknownGranularity { name: s.to_string() })
    }
}

/// A category-axis entry: a bucket label or a distinct categorical value.
///
/// Year-like labels (years, decades, centuries) are integers; everything
/// else is text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Year(i32),
    Text(String),
}

impl Category {
    /// Interprets the label as a year, parsing text labels if needed.
    #[must_use]
    pub fn as_year(&self) -> Option<i32> {
        match self {
            Self::Year(y) => Some(*y),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Year(_) => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(y) => write!(f, "{y}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i32> for Category {
    fn from(value: i32) -> Self {
        Self::Year(value)
    }
}

/// Bucketing rule for a temporal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketSpec {
    /// `YYYY-MM-DD`
    Day,
    /// `YYYY-MM`
    Month,
    /// Calendar year as an integer.
    Year,
    /// Aligned half-open year ranges `[label, label + span)`.
    Range { granularity: Granularity, span: i32 },
}

impl BucketSpec {
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        match self {
            Self::Day => Granularity::Days,
            Self::Month => Granularity::Months,
            Self::Year => Granularity::Years,
            Self::Range { granularity, .. } => *granularity,
        }
    }

    /// Label of the bucket containing `date`.
    ///
    /// Range buckets have no per-date label and return `None`.
    #[must_use]
    pub fn label_of(&self, date: NaiveDate) -> Option<Category> {
        match self {
            Self::Day => Some(Category::Text(day_label(date))),
            Self::Month => Some(Category::Text(date.format("%Y-%m").to_string())),
            Self::Year => Some(Category::Year(date.year())),
            Self::Range { .. } => None,
        }
    }

    /// Whether `date` falls in the bucket named by `label`.
    #[must_use]
    pub fn matches(&self, date: NaiveDate, label: &Category) -> bool {
        match self {
            Self::Day | Self::Month => self.label_of(date).as_ref() == Some(label),
            Self::Year => label.as_year() == Some(date.year()),
            Self::Range { span, .. } => {
                let Some(start) = label.as_year() else {
                    return false;
                };
                let Some(end) = start.checked_add(*span) else {
                    return false;
                };
                date >= year_start(start) && date < year_start(end)
            }
        }
    }

    /// Ordered bucket labels for the given dates.
    ///
    /// `dates` should be sorted ascending and distinct. Per-date buckets
    /// map each date to its label and drop repeats. Range buckets cover
    /// `[floor(min / span) * span, ceil(max / span) * span)` in steps of `span`.
    #[must_use]
    pub fn labels(&self, dates: &[NaiveDate]) -> Vec<Category> {
        match self {
            Self::Range { span, .. } => range_labels(dates, *span),
            _ => {
                let mut out: Vec<Category> = dates.iter().filter_map(|d| self.label_of(*d)).collect();
                out.dedup();
                out
            }
        }
    }
}

fn day_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn range_labels(dates: &[NaiveDate], span: i32) -> Vec<Category> {
    let span = span.max(1);
    let years = dates.iter().map(Datelike::year);
    let (Some(min_year), Some(max_year)) = (years.clone().min(), years.max()) else {
        return Vec::new();
    };

    let start = min_year.div_euclid(span) * span;
    let end = if max_year.rem_euclid(span) == 0 {
        max_year
    } else {
        (max_year.div_euclid(span) + 1) * span
    };

    (start..end).step_by(span as usize).map(Category::Year).collect()
}

/// Sorted, de-duplicated copy of `dates`.
#[must_use]
pub fn sorted_distinct(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<NaiveDate> {
    let mut out: Vec<NaiveDate> = dates.into_iter().collect();
    out.sort_unstable();
    out.dedup();
    out
}
