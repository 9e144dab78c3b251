//! Person records and typed field access.
//!
//! A `Record` is one row of the subject dataset. Charts group records by a
//! `Field`, which is a closed set of variants with a typed accessor so the
//! aggregation engine never looks fields up by string.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::storage::Keyed;
use crate::time::deserialize_date;

/// Value of the constant `all` field after normalization.
pub const ALL_VALUE: &str = "all";

/// One person in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store key.
    pub id: i64,

    /// Display name; not chartable.
    #[serde(default)]
    pub name: String,

    /// Birth date (UTC calendar day).
    #[serde(deserialize_with = "deserialize_date")]
    pub birthdate: NaiveDate,

    pub sex: String,

    pub blood_group: String,

    pub job: String,

    pub company: String,

    /// Constant `"all"` after normalization, so a chart can count everything.
    #[serde(default)]
    pub all: String,
}

impl Record {
    /// Creates a normalized record.
    #[must_use]
    pub fn new(
        id: i64,
        birthdate: NaiveDate,
        sex: impl Into<String>,
        blood_group: impl Into<String>,
        job: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: String::new(),
            birthdate,
            sex: sex.into(),
            blood_group: blood_group.into(),
            job: job.into(),
            company: company.into(),
            all: ALL_VALUE.to_string(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Typed accessor for a chartable field.
    #[must_use]
    pub fn value(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::All => FieldValue::Text(&self.all),
            Field::Sex => FieldValue::Text(&self.sex),
            Field::BloodGroup => FieldValue::Text(&self.blood_group),
            Field::Job => FieldValue::Text(&self.job),
            Field::Company => FieldValue::Text(&self.company),
            Field::Birthdate => FieldValue::Date(self.birthdate),
        }
    }
}

impl Keyed for Record {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn normalize(mut self) -> Result<Self, ValidationError> {
        self.all = ALL_VALUE.to_string();
        Ok(self)
    }
}

/// Chartable record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    All,
    Sex,
    BloodGroup,
    Job,
    Company,
    Birthdate,
}

impl Field {
    /// Every chartable field, in form order.
    pub const ALL: [Self; 6] = [
        Self::All,
        Self::Sex,
        Self::BloodGroup,
        Self::Job,
        Self::Company,
        Self::Birthdate,
    ];

    /// The temporal field used for date bucketing and range filtering.
    pub const TEMPORAL: Self = Self::Birthdate;

    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Sex => "sex",
            Self::BloodGroup => "blood_group",
            Self::Job => "job",
            Self::Company => "company",
            Self::Birthdate => "birthdate",
        }
    }

    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Birthdate)
    }

    /// Human-readable title used for axes and single-series names.
    #[must_use]
    pub fn title(self) -> String {
        match self {
            Self::Birthdate => "Birth Date".to_string(),
            Self::Sex => "Gender".to_string(),
            other => title_case(other.as_str()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| ValidationError::UnknownField { name: s.to_string() })
    }
}

/// A borrowed field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Date(NaiveDate),
}

impl FieldValue<'_> {
    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(_) => None,
        }
    }
}

/// Converts `snake_case` to `Title Case`.
#[must_use]
pub fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new(
            5,
            NaiveDate::from_ymd_opt(1984, 2, 29).unwrap(),
            "M",
            "A+",
            "Engineer",
            "Apple",
        )
    }

    #[test]
    fn test_record_value_accessor() {
        let r = sample();
        assert_eq!(r.value(Field::Sex), FieldValue::Text("M"));
        assert_eq!(r.value(Field::BloodGroup), FieldValue::Text("A+"));
        assert_eq!(r.value(Field::All), FieldValue::Text("all"));
        assert_eq!(
            r.value(Field::Birthdate).as_date(),
            NaiveDate::from_ymd_opt(1984, 2, 29)
        );
    }

    #[test]
    fn test_with_name_keeps_chartable_fields() {
        let r = sample().with_name("Grace");
        assert_eq!(r.name, "Grace");
        assert_eq!(r.value(Field::Job), FieldValue::Text("Engineer"));
        assert_eq!(serde_json::to_value(&r).unwrap()["name"], "Grace");
    }

    #[test]
    fn test_record_deserialize_and_normalize() {
        let json = r#"{"id":2,"name":"Katrina","birthdate":"1990-07-01T12:00:00Z",
            "blood_group":"B-","sex":"F","job":"Teacher","company":"University"}"#;
        let r: Record = serde_json::from_str(json).unwrap();
        assert_eq!(r.all, "");
        assert_eq!(r.name, "Katrina");
        assert_eq!(r.birthdate, NaiveDate::from_ymd_opt(1990, 7, 1).unwrap());

        let r = r.normalize().unwrap();
        assert_eq!(r.all, ALL_VALUE);
    }

    #[test]
    fn test_record_deserialize_rejects_bad_date() {
        let json = r#"{"id":2,"birthdate":"not a date","blood_group":"B-","sex":"F","job":"T","company":"U"}"#;
        assert!(serde_json::from_str::<Record>(json).is_err());
    }

    #[test]
    fn test_field_parse_round_trip_names() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>().unwrap(), field);
        }
        assert!("height".parse::<Field>().is_err());
    }

    #[test]
    fn test_field_titles() {
        assert_eq!(Field::Birthdate.title(), "Birth Date");
        assert_eq!(Field::Sex.title(), "Gender");
        assert_eq!(Field::BloodGroup.title(), "Blood Group");
        assert_eq!(Field::All.title(), "All");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("blood_group"), "Blood Group");
        assert_eq!(title_case("job"), "Job");
        assert_eq!(title_case("__a__b"), "A B");
    }

    #[test]
    fn test_only_birthdate_is_temporal() {
        let temporal: Vec<_> = Field::ALL.into_iter().filter(|f| f.is_temporal()).collect();
        assert_eq!(temporal, vec![Field::TEMPORAL]);
    }
}
