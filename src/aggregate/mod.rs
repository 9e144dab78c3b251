//! Aggregation engine.
//!
//! Turns a filtered record set and one `ChartSpec` into a category axis and
//! the series to draw over it. Two modes exist:
//!
//! - **Simple**: one axis (or a temporal axis counted "for all time"). The
//!   remaining key is counted per distinct value, in first-appearance order.
//! - **Cross-tab**: the first axis gives the categories, the second splits
//!   records into one series per value. A temporal axis is bucketed by the
//!   chart's granularity.
//!
//! The engine never fails. Empty input, malformed specs and unsupported
//! granularities all degrade to a chart with no series.

mod key;
mod view;

use indexmap::IndexMap;
use tracing::warn;

use crate::bucket::{Category, Granularity};
use crate::chart::ChartSpec;
use crate::palette::Palette;
use crate::record::{Field, Record};

pub use key::{category_of, distinct_values, AxisKey};
pub use view::{Axis, ChartMode, ChartView, Point, Series, SeriesData};

/// Granularity applied to a temporal cross-tab axis when the chart names none.
pub const DEFAULT_GRANULARITY: Granularity = Granularity::Days;

/// Decides how `spec` groups records, or `None` if its axis list is unusable.
#[must_use]
pub fn resolve_mode(spec: &ChartSpec) -> Option<ChartMode> {
    match spec.axes.as_slice() {
        [key] => Some(ChartMode::Simple { key: *key }),
        [first, second] => {
            if spec.has_temporal_axis() && spec.count_by == Some(Granularity::ForAllTime) {
                let key = if first.is_temporal() { *second } else { *first };
                Some(ChartMode::Simple { key })
            } else {
                Some(ChartMode::CrossTab {
                    compared: *first,
                    chart: *second,
                })
            }
        }
        _ => None,
    }
}

/// Computes the render-ready view of `spec` over `records`.
#[must_use]
pub fn aggregate(records: &[Record], spec: &ChartSpec) -> ChartView {
    let mut view = ChartView {
        chart_id: spec.id,
        title: spec.title.clone(),
        subtitle: spec.subtitle.clone().unwrap_or_default(),
        chart_type: spec.chart_type,
        mode: resolve_mode(spec),
        x_axis: None,
        y_axis: None,
        colors: Palette::override_for(spec.colors.as_deref()),
        series: Vec::new(),
        record_count: records.len(),
    };

    let Some(mode) = view.mode else {
        warn!(chart_id = spec.id, axes = spec.axes.len(), "chart has an unusable axis list");
        return view;
    };
    if records.is_empty() {
        return view;
    }

    match mode {
        ChartMode::Simple { key } => simple(records, spec, key, &mut view),
        ChartMode::CrossTab { compared, chart } => {
            let (Some(compared_key), Some(chart_key)) = (axis_key(spec, compared), axis_key(spec, chart)) else {
                return view;
            };
            cross_tab(records, spec, compared_key, chart_key, &mut view);
        }
    }
    view
}

/// Computes views for every spec, in spec order.
#[must_use]
pub fn aggregate_all(records: &[Record], specs: &[ChartSpec]) -> Vec<ChartView> {
    specs.iter().map(|spec| aggregate(records, spec)).collect()
}

fn axis_key(spec: &ChartSpec, field: Field) -> Option<AxisKey> {
    if !field.is_temporal() {
        return Some(AxisKey::Categorical(field));
    }
    let granularity = spec.count_by.unwrap_or(DEFAULT_GRANULARITY);
    match granularity.bucket_spec() {
        Ok(Some(bucket)) => Some(AxisKey::Temporal { field, bucket }),
        Ok(None) => Some(AxisKey::Categorical(field)),
        Err(err) => {
            warn!(chart_id = spec.id, %granularity, error = %err, "chart left empty");
            None
        }
    }
}

fn simple(records: &[Record], spec: &ChartSpec, key: Field, view: &mut ChartView) {
    let mut counts: IndexMap<Category, u64> = IndexMap::new();
    for record in records {
        *counts.entry(category_of(record, key)).or_insert(0) += 1;
    }

    let title = key.title();
    view.x_axis = Some(Axis {
        title: title.clone(),
        categories: counts.keys().cloned().collect(),
    });
    view.series.push(Series {
        name: title,
        chart_type: spec.chart_type,
        data: SeriesData::Points(
            counts
                .into_iter()
                .map(|(name, count)| Point { name, count })
                .collect(),
        ),
    });
}

fn cross_tab(records: &[Record], spec: &ChartSpec, compared: AxisKey, chart: AxisKey, view: &mut ChartView) {
    let abscissa = compared.points(records);
    let chart_points = chart.points(records);

    // counts[p][a]: records in chart point p whose compared value matches abscissa[a].
    let mut counts = vec![vec![0u64; abscissa.len()]; chart_points.len()];
    for record in records {
        let hits: Vec<usize> = abscissa
            .iter()
            .enumerate()
            .filter(|(_, label)| compared.matches(record, label))
            .map(|(i, _)| i)
            .collect();
        if hits.is_empty() {
            continue;
        }
        for (p, point) in chart_points.iter().enumerate() {
            if chart.matches(record, point) {
                for &a in &hits {
                    counts[p][a] += 1;
                }
            }
        }
    }

    view.x_axis = Some(Axis {
        title: compared.field().title(),
        categories: abscissa,
    });
    view.y_axis = Some(Axis {
        title: chart.field().title(),
        categories: Vec::new(),
    });
    view.series = chart_points
        .into_iter()
        .zip(counts)
        .map(|(point, data)| Series {
            name: point.to_string(),
            chart_type: spec.chart_type,
            data: SeriesData::Counts(data),
        })
        .collect();
}
