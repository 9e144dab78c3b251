//! Recompute state shared by every pass.
//!
//! The context caches the last observed store versions and snapshots. A pass
//! first syncs anything whose version moved, then filters the record snapshot
//! by the active range and aggregates every chart over the result.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::{aggregate_all, ChartView};
use crate::chart::ChartSpec;
use crate::error::StorageError;
use crate::record::Record;
use crate::storage::VersionedStore;
use crate::time::DateRange;

use super::layout::{derive_tiles, Tile};

/// Output of one recompute pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// 1-based pass number.
    pub pass: u64,
    /// Range the records were filtered by.
    pub range: Option<DateRange>,
    /// Earliest and latest birthdate across all records.
    pub bounds: Option<DateRange>,
    pub tiles: Vec<Tile>,
    pub charts: Vec<ChartView>,
    /// Records that fell inside `range`.
    pub record_count: usize,
}

impl Dashboard {
    #[must_use]
    pub fn chart(&self, chart_id: i64) -> Option<&ChartView> {
        self.charts.iter().find(|c| c.chart_id == chart_id)
    }
}

#[derive(Debug, Default)]
pub struct RecomputeContext {
    data_version: u64,
    settings_version: u64,
    records: Vec<Record>,
    settings: Vec<ChartSpec>,
    tiles: Vec<Tile>,
    bounds: Option<DateRange>,
    explicit_range: Option<DateRange>,
    passes: u64,
    aggregations: u64,
}

impl RecomputeContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-derives tiles if the chart store moved past the cached version.
    pub fn sync_settings(&mut self, charts: &dyn VersionedStore<ChartSpec>) -> Result<bool, StorageError> {
        let version = charts.version();
        if version <= self.settings_version {
            return Ok(false);
        }
        self.settings = charts.select_all()?;
        self.tiles = derive_tiles(&self.settings);
        self.settings_version = version;
        debug!(version, charts = self.settings.len(), "chart settings synced");
        Ok(true)
    }

    /// Re-snapshots records and bounds if the record store moved.
    pub fn sync_data(&mut self, records: &dyn VersionedStore<Record>) -> Result<bool, StorageError> {
        let version = records.version();
        if version <= self.data_version {
            return Ok(false);
        }
        self.records = records.select_all()?;
        self.bounds = DateRange::covering(self.records.iter().map(|r| r.birthdate));
        self.data_version = version;
        debug!(version, records = self.records.len(), "record snapshot synced");
        Ok(true)
    }

    /// Syncs both stores. Returns true if either one changed.
    pub fn refresh(
        &mut self,
        records: &dyn VersionedStore<Record>,
        charts: &dyn VersionedStore<ChartSpec>,
    ) -> Result<bool, StorageError> {
        let settings = self.sync_settings(charts)?;
        let data = self.sync_data(records)?;
        Ok(settings || data)
    }

    /// Pins the active range. It survives later data changes.
    pub fn set_range(&mut self, range: DateRange) {
        info!(%range, "date range set");
        self.explicit_range = Some(range);
    }

    /// Unpins the active range, falling back to the data bounds.
    pub fn clear_range(&mut self) {
        self.explicit_range = None;
    }

    /// The pinned range, or the data bounds when nothing is pinned.
    #[must_use]
    pub fn active_range(&self) -> Option<DateRange> {
        self.explicit_range.or(self.bounds)
    }

    #[must_use]
    pub const fn bounds(&self) -> Option<DateRange> {
        self.bounds
    }

    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    #[must_use]
    pub const fn data_version(&self) -> u64 {
        self.data_version
    }

    #[must_use]
    pub const fn settings_version(&self) -> u64 {
        self.settings_version
    }

    #[must_use]
    pub const fn passes(&self) -> u64 {
        self.passes
    }

    /// Total per-chart aggregations across all passes.
    #[must_use]
    pub const fn aggregations(&self) -> u64 {
        self.aggregations
    }

    /// Records whose birthdate lies inside the active range, inclusive.
    #[must_use]
    pub fn filtered_records(&self) -> Vec<Record> {
        let Some(range) = self.active_range() else {
            return Vec::new();
        };
        self.records
            .iter()
            .filter(|r| range.contains(r.birthdate))
            .cloned()
            .collect()
    }

    /// Aggregates every chart over the filtered snapshot.
    pub fn recompute(&mut self) -> Dashboard {
        let filtered = self.filtered_records();
        let charts = aggregate_all(&filtered, &self.settings);
        self.passes += 1;
        self.aggregations += charts.len() as u64;
        debug!(
            pass = self.passes,
            records = filtered.len(),
            charts = charts.len(),
            "recompute pass finished"
        );
        Dashboard {
            pass: self.passes,
            range: self.active_range(),
            bounds: self.bounds,
            tiles: self.tiles.clone(),
            charts,
            record_count: filtered.len(),
        }
    }
}
