//! Error types for Tallyboard.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! specific conditions. The aggregation engine itself never fails on empty or
//! missing data; these types cover input validation, store mutations, record
//! loading and the recompute worker.

use chrono::NaiveDate;
use thiserror::Error;

/// Validation errors that occur while checking input values.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid date range: from ({from}) must not be after to ({to})")]
    InvalidDateRange {
        from: NaiveDate,
        to: NaiveDate,
    },

    #[error("Cannot parse '{input}' as a date")]
    InvalidDate {
        input: String,
    },

    #[error("Chart {chart_id} has {count} axes, expected 1 or 2")]
    InvalidAxisCount {
        chart_id: i64,
        count: usize,
    },

    #[error("Unknown field '{name}'")]
    UnknownField {
        name: String,
    },

    #[error("Unknown granularity '{name}'")]
    UnknownGranularity {
        name: String,
    },

    #[error("Unknown chart type '{name}'")]
    UnknownChartType {
        name: String,
    },
}

/// Errors raised by a versioned store while applying a mutation.
///
/// A mutation that returns one of these leaves the committed collection and
/// its version counter exactly as they were.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store '{store}' lock is poisoned ({context})")]
    PoisonedLock {
        store: &'static str,
        context: &'static str,
    },

    #[error("Store '{store}' cannot assign an id after {max_id}")]
    IdOverflow {
        store: &'static str,
        max_id: i64,
    },

    #[error("Store '{store}' rejected an item: {source}")]
    Rejected {
        store: &'static str,
        #[source]
        source: ValidationError,
    },
}

/// Errors from the bucketing engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BucketError {
    #[error("Granularity '{granularity}' is not supported")]
    UnsupportedGranularity {
        granularity: &'static str,
    },
}

/// Errors from a record source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read records from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode records: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Record id {id} appears more than once")]
    DuplicateId {
        id: i64,
    },
}

/// Top-level error type for Tallyboard.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Bucketing error: {0}")]
    Bucket(#[from] BucketError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Channel disconnected: {path}")]
    Disconnected {
        path: String,
    },

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout {
        what: &'static str,
        timeout_ms: u64,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl TallyError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a disconnection error for the named channel.
    #[must_use]
    pub fn disconnected(path: impl Into<String>) -> Self {
        Self::Disconnected { path: path.into() }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a store mutation failure.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is a record source failure.
    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Bucket(_) => false,
            Self::Storage(e) => !matches!(e, StorageError::Rejected { .. }),
            Self::Source(e) => matches!(e, SourceError::Io { .. }),
            Self::Disconnected { .. } | Self::Timeout { .. } => true,
            Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for Tallyboard operations.
pub type TallyResult<T> = Result<T, TallyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_date_range() {
        let from = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let err = ValidationError::InvalidDateRange { from, to };
        let msg = format!("{err}");
        assert!(msg.contains("Invalid date range"));
        assert!(msg.contains("2020-05-01"));
    }

    #[test]
    fn test_validation_error_axis_count() {
        let err = ValidationError::InvalidAxisCount { chart_id: 7, count: 3 };
        let msg = format!("{err}");
        assert!(msg.contains("Chart 7"));
        assert!(msg.contains("3 axes"));
    }

    #[test]
    fn test_storage_error_rejected_keeps_source() {
        let err = StorageError::Rejected {
            store: "charts",
            source: ValidationError::InvalidAxisCount { chart_id: 1, count: 0 },
        };
        assert!(err.to_string().contains("charts"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_bucket_error() {
        let err = BucketError::UnsupportedGranularity { granularity: "dynamic" };
        assert!(err.to_string().contains("dynamic"));
    }

    #[test]
    fn test_tally_error_from_storage_is_retryable() {
        let err: TallyError = StorageError::PoisonedLock {
            store: "records",
            context: "replace_all",
        }
        .into();
        assert!(err.is_storage());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_tally_error_rejection_not_retryable() {
        let err: TallyError = StorageError::Rejected {
            store: "charts",
            source: ValidationError::InvalidAxisCount { chart_id: 1, count: 0 },
        }
        .into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_tally_error_validation() {
        let err: TallyError = ValidationError::UnknownField {
            name: "height".to_string(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_tally_error_internal_and_disconnected() {
        let err = TallyError::internal("unexpected state");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("unexpected state"));

        let err = TallyError::disconnected("recompute_control");
        assert!(err.is_retryable());
        assert!(err.to_string().contains("recompute_control"));
    }
}
