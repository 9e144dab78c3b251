//! # Tallyboard - cross-tab aggregation over person records
//!
//! Tallyboard turns a store of person records and a store of chart
//! definitions into render-ready chart series. Charts count records either by
//! one field or by two fields cross-tabulated, with birthdates bucketed into
//! days, months, years, decades or centuries.
//!
//! ## Core Concepts
//!
//! - **Record**: one person, keyed by id, with a birthdate and categorical fields
//! - **ChartSpec**: a chart definition naming one or two axis fields and a bucketing granularity
//! - **VersionedStore**: a keyed collection whose version bumps on every mutation
//! - **RecomputeController**: a debounced worker that re-aggregates when either store or the date range changes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tallyboard::{ChartSpec, ControllerConfig, InMemoryStore, JsonFileSource, RecomputeController, VersionedStore};
//!
//! let records = Arc::new(InMemoryStore::new("records"));
//! let charts = Arc::new(InMemoryStore::new("charts"));
//! charts.replace_all(ChartSpec::defaults())?;
//! tallyboard::load_records(records.as_ref(), &JsonFileSource::new("people.json"))?;
//!
//! let controller = RecomputeController::spawn(records, charts, ControllerConfig::default())?;
//! let dashboard = controller.flush()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod bucket;
pub mod chart;
pub mod error;
pub mod palette;
pub mod record;
pub mod time;

// Stores, aggregation and recompute
pub mod aggregate;
pub mod recompute;
pub mod source;
pub mod storage;

pub use aggregate::{aggregate, aggregate_all, Axis, ChartMode, ChartView, Point, Series, SeriesData};
pub use bucket::{BucketSpec, Category, Granularity};
pub use chart::{ChartSpec, ChartType};
pub use error::{BucketError, SourceError, StorageError, TallyError, TallyResult, ValidationError};
pub use palette::{Palette, DEFAULT_PALETTE};
pub use record::{Field, FieldValue, Record};
pub use recompute::{ControllerConfig, Dashboard, RecomputeContext, RecomputeController, Tile, TileSize};
pub use source::{load_records, JsonFileSource, JsonStrSource, RecordSource};
pub use storage::{InMemoryStore, InMemoryStores, Keyed, StoreChange, VersionedStore};
pub use time::DateRange;
