//! Record sources.
//!
//! A source hands back a full batch of records; loading it replaces the
//! record store wholesale. Date fields arrive as ISO strings and are parsed
//! during decoding.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{SourceError, TallyResult};
use crate::record::Record;
use crate::storage::VersionedStore;

/// Anything that can produce a batch of records.
pub trait RecordSource: Send + Sync {
    /// Human-readable origin, for logs.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Vec<Record>, SourceError>;
}

/// Reads a JSON array of records from a file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<Record>, SourceError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| SourceError::Io {
            path: self.describe(),
            source: e,
        })?;
        decode_records(&raw)
    }
}

/// Decodes records from an in-memory JSON document.
#[derive(Debug, Clone)]
pub struct JsonStrSource {
    json: String,
}

impl JsonStrSource {
    #[must_use]
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

impl RecordSource for JsonStrSource {
    fn describe(&self) -> String {
        format!("<inline json, {} bytes>", self.json.len())
    }

    fn fetch(&self) -> Result<Vec<Record>, SourceError> {
        decode_records(&self.json)
    }
}

/// Parses a JSON array of records, rejecting repeated ids.
pub fn decode_records(json: &str) -> Result<Vec<Record>, SourceError> {
    let records: Vec<Record> = serde_json::from_str(json)?;
    let mut seen = HashSet::with_capacity(records.len());
    for record in &records {
        if !seen.insert(record.id) {
            return Err(SourceError::DuplicateId { id: record.id });
        }
    }
    Ok(records)
}

/// Fetches from `source` and replaces the store contents with the batch.
///
/// On any failure the store is left untouched. Returns the number of records
/// loaded.
pub fn load_records(store: &dyn VersionedStore<Record>, source: &dyn RecordSource) -> TallyResult<usize> {
    let records = source.fetch().map_err(|e| {
        warn!(source = %source.describe(), error = %e, "record fetch failed");
        e
    })?;
    let count = records.len();
    store.replace_all(records)?;
    info!(source = %source.describe(), records = count, version = store.version(), "records loaded");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use chrono::NaiveDate;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"id": 1, "name": "Ada", "birthdate": "1984-03-01", "sex": "F", "blood_group": "A", "job": "Engineer", "company": "Acme"},
        {"id": 2, "birthdate": "1991-07-09T12:30:00Z", "sex": "M", "blood_group": "B", "job": "Pilot", "company": "Initech"}
    ]"#;

    #[test]
    fn str_source_decodes_dates_and_fills_all() {
        let records = JsonStrSource::new(SAMPLE).fetch().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].birthdate, NaiveDate::from_ymd_opt(1984, 3, 1).unwrap());
        assert_eq!(records[1].birthdate, NaiveDate::from_ymd_opt(1991, 7, 9).unwrap());
        assert_eq!(records[1].name, "");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"[
            {"id": 7, "birthdate": "1990-01-01", "sex": "F", "blood_group": "A", "job": "x", "company": "y"},
            {"id": 7, "birthdate": "1991-01-01", "sex": "M", "blood_group": "B", "job": "x", "company": "y"}
        ]"#;
        let err = decode_records(json).unwrap_err();
        assert!(matches!(err, SourceError::DuplicateId { id: 7 }));
    }

    #[test]
    fn load_replaces_store_and_normalizes() {
        let store = InMemoryStore::<Record>::new("records");
        let n = load_records(&store, &JsonStrSource::new(SAMPLE)).unwrap();
        assert_eq!(n, 2);
        assert_eq!(store.version(), 1);
        assert_eq!(store.get(1).unwrap().unwrap().all, "all");
    }

    #[test]
    fn failed_fetch_leaves_store_untouched() {
        let store = InMemoryStore::<Record>::new("records");
        load_records(&store, &JsonStrSource::new(SAMPLE)).unwrap();

        let err = load_records(&store, &JsonStrSource::new("{not json")).unwrap_err();
        assert!(err.is_source());
        assert!(!err.is_retryable());
        assert_eq!(store.version(), 1);
        assert_eq!(store.len(), 2);

        let bad_date = r#"[{"id": 1, "birthdate": "yesterday", "sex": "F", "blood_group": "A", "job": "x", "company": "y"}]"#;
        assert!(load_records(&store, &JsonStrSource::new(bad_date)).is_err());
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn file_source_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let source = JsonFileSource::new(file.path());
        assert_eq!(source.path(), file.path());
        let records = source.fetch().unwrap();
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn missing_file_is_retryable_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryStore::<Record>::new("records");
        let err = load_records(&store, &JsonFileSource::new(dir.path().join("missing.json"))).unwrap_err();
        assert!(err.is_source());
        assert!(err.is_retryable());
        assert_eq!(store.version(), 0);
    }
}
