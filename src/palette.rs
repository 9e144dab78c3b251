//! Named color palettes.
//!
//! A chart may name a palette to override the renderer's default colors.
//! The table is fixed; unknown names and `"default"` yield no override.

use serde::Serialize;
use tracing::debug;

/// Name that explicitly keeps the renderer's palette.
pub const DEFAULT_PALETTE: &str = "default";

/// A named list of series colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub name: &'static str,
    pub colors: &'static [&'static str],
}

/// Palettes available to chart specs.
pub const PALETTES: &[Palette] = &[
    Palette {
        name: "pastel",
        colors: &["#a8d8ea", "#aa96da", "#fcbad3", "#ffffd2", "#b5ead7", "#ffdac1"],
    },
    Palette {
        name: "ocean",
        colors: &["#03045e", "#0077b6", "#00b4d8", "#48cae4", "#90e0ef", "#caf0f8"],
    },
    Palette {
        name: "sunset",
        colors: &["#f8b195", "#f67280", "#c06c84", "#6c5b7b", "#355c7d", "#2a363b"],
    },
    Palette {
        name: "forest",
        colors: &["#2d6a4f", "#40916c", "#52b788", "#74c69d", "#95d5b2", "#b7e4c7"],
    },
    Palette {
        name: "monochrome",
        colors: &["#111111", "#444444", "#777777", "#aaaaaa", "#cccccc", "#eeeeee"],
    },
];

impl Palette {
    /// Looks up a palette by name.
    #[must_use]
    pub fn find(name: &str) -> Option<&'static Self> {
        PALETTES.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Colors to attach for an optional chart palette name, if any.
    #[must_use]
    pub fn override_for(name: Option<&str>) -> Option<Vec<String>> {
        let name = name?.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(DEFAULT_PALETTE) {
            return None;
        }
        match Self::find(name) {
            Some(p) => Some(p.colors.iter().map(|c| (*c).to_string()).collect()),
            None => {
                debug!(palette = name, "unknown palette; keeping renderer colors");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_missing_yield_no_override() {
        assert!(Palette::override_for(None).is_none());
        assert!(Palette::override_for(Some("default")).is_none());
        assert!(Palette::override_for(Some("")).is_none());
        assert!(Palette::override_for(Some("neon")).is_none());
    }

    #[test]
    fn test_known_palette_overrides() {
        let colors = Palette::override_for(Some("Ocean")).unwrap();
        assert_eq!(colors.len(), 6);
        assert_eq!(colors[0], "#03045e");
    }

    #[test]
    fn test_palette_names_unique() {
        let mut names: Vec<&str> = PALETTES.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PALETTES.len());
        assert!(Palette::find(DEFAULT_PALETTE).is_none());
    }
}
