//! Grouping keys.
//!
//! An axis field resolves either to a plain categorical key or, when it is
//! the temporal field in a cross-tab, to a date bucketing rule.

use indexmap::IndexSet;

use crate::bucket::{sorted_distinct, BucketSpec, Category};
use crate::record::{Field, FieldValue, Record};

/// The category a record falls into for a categorical key.
#[must_use]
pub fn category_of(record: &Record, field: Field) -> Category {
    match record.value(field) {
        FieldValue::Text(s) => Category::Text(s.to_string()),
        FieldValue::Date(d) => Category::Text(d.format("%Y-%m-%d").to_string()),
    }
}

/// Distinct categorical values of `field`, in order of first appearance.
#[must_use]
pub fn distinct_values(records: &[Record], field: Field) -> Vec<Category> {
    records
        .iter()
        .map(|r| category_of(r, field))
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// A resolved grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKey {
    Categorical(Field),
    Temporal { field: Field, bucket: BucketSpec },
}

impl AxisKey {
    #[must_use]
    pub const fn field(&self) -> Field {
        match self {
            Self::Categorical(field) | Self::Temporal { field, .. } => *field,
        }
    }

    /// Ordered axis values for this key over `records`.
    #[must_use]
    pub fn points(&self, records: &[Record]) -> Vec<Category> {
        match self {
            Self::Categorical(field) => distinct_values(records, *field),
            Self::Temporal { field, bucket } => {
                let dates = sorted_distinct(records.iter().filter_map(|r| r.value(*field).as_date()));
                bucket.labels(&dates)
            }
        }
    }

    /// Whether `record` belongs to the axis value `label`.
    #[must_use]
    pub fn matches(&self, record: &Record, label: &Category) -> bool {
        match self {
            Self::Categorical(field) => match (record.value(*field), label) {
                (FieldValue::Text(v), Category::Text(l)) => v == l,
                (FieldValue::Date(_), Category::Text(_)) => &category_of(record, *field) == label,
                (_, Category::Year(_)) => false,
            },
            Self::Temporal { field, bucket } => record
                .value(*field)
                .as_date()
                .is_some_and(|d| bucket.matches(d, label)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::Granularity;
    use chrono::NaiveDate;

    fn rec(id: i64, y: i32, sex: &str) -> Record {
        Record::new(id, NaiveDate::from_ymd_opt(y, 6, 1).unwrap(), sex, "A", "Cook", "Acme")
    }

    #[test]
    fn test_distinct_values_first_appearance() {
        let records = vec![rec(1, 1990, "M"), rec(2, 1991, "F"), rec(3, 1992, "M"), rec(4, 1993, "X")];
        assert_eq!(
            distinct_values(&records, Field::Sex),
            vec![Category::from("M"), Category::from("F"), Category::from("X")]
        );
    }

    #[test]
    fn test_categorical_birthdate_uses_iso_day() {
        let records = vec![rec(1, 1990, "M")];
        let key = AxisKey::Categorical(Field::Birthdate);
        let points = key.points(&records);
        assert_eq!(points, vec![Category::from("1990-06-01")]);
        assert!(key.matches(&records[0], &points[0]));
    }

    #[test]
    fn test_temporal_points_are_sorted_buckets() {
        let records = vec![rec(1, 2003, "M"), rec(2, 1987, "F"), rec(3, 1995, "M")];
        let key = AxisKey::Temporal {
            field: Field::Birthdate,
            bucket: Granularity::Decades.bucket_spec().unwrap().unwrap(),
        };
        assert_eq!(
            key.points(&records),
            vec![Category::Year(1980), Category::Year(1990), Category::Year(2000)]
        );
        assert!(key.matches(&records[1], &Category::Year(1980)));
        assert!(!key.matches(&records[1], &Category::Year(1990)));
    }

    #[test]
    fn test_categorical_never_matches_year_label() {
        let key = AxisKey::Categorical(Field::Sex);
        assert!(!key.matches(&rec(1, 1990, "M"), &Category::Year(1990)));
    }
}
