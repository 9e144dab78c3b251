//! Tile layout hints.

use serde::{Deserialize, Serialize};

use crate::chart::ChartSpec;

/// Grid columns on the desktop board; mobile tiles always span all of them.
pub const BOARD_COLUMNS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSize {
    pub cols: u8,
    pub rows: u8,
}

/// Grid placement for one chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub chart_id: i64,
    pub desktop: TileSize,
    pub mobile: TileSize,
}

impl Tile {
    #[must_use]
    pub const fn for_chart(spec: &ChartSpec) -> Self {
        let rows = if spec.tall { 2 } else { 1 };
        Self {
            chart_id: spec.id,
            desktop: TileSize {
                cols: if spec.wide { BOARD_COLUMNS } else { 1 },
                rows,
            },
            mobile: TileSize {
                cols: BOARD_COLUMNS,
                rows,
            },
        }
    }
}

/// One tile per chart, in chart order.
#[must_use]
pub fn derive_tiles(specs: &[ChartSpec]) -> Vec<Tile> {
    specs.iter().map(Tile::for_chart).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_follow_wide_and_tall_hints() {
        let tiles = derive_tiles(&ChartSpec::defaults());
        assert_eq!(tiles.len(), 4);

        // "Default Chart": wide only.
        assert_eq!(tiles[0].desktop, TileSize { cols: 2, rows: 1 });
        assert_eq!(tiles[0].mobile, TileSize { cols: 2, rows: 1 });

        // "Gender Chart": neither.
        assert_eq!(tiles[1].desktop, TileSize { cols: 1, rows: 1 });

        // "Job Chart": wide and tall.
        assert_eq!(tiles[3].chart_id, 4);
        assert_eq!(tiles[3].desktop, TileSize { cols: 2, rows: 2 });
        assert_eq!(tiles[3].mobile, TileSize { cols: 2, rows: 2 });
    }
}
