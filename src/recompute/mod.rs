//! Debounced dashboard recomputation.
//!
//! Store changes and range edits are coalesced into a single pass per burst.
//! Each pass brings cached snapshots up to date, filters records by the
//! active date range and re-aggregates every chart.

mod coalesce;
mod context;
mod controller;
mod layout;

pub use coalesce::Coalescer;
pub use context::{Dashboard, RecomputeContext};
pub use controller::{ControllerConfig, RecomputeController};
pub use layout::{derive_tiles, Tile, TileSize, BOARD_COLUMNS};
