//! Engine configuration loaded from TOML.

use std::time::Duration;

use glam::Vec2;
use rowmatch_core::{CellCoord, PaletteColor};
use rowmatch_system_consolidation as consolidation;
use rowmatch_system_hint as hint;
use rowmatch_system_supplement as supplement;
use serde::Deserialize;
use thiserror::Error;

/// Problems detected while loading an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML or does not match the schema.
    #[error("failed to parse engine configuration")]
    Parse(#[from] toml::de::Error),
    /// The grid has no cells.
    #[error("grid must have at least one column and one row, got {columns}x{rows}")]
    EmptyGrid {
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
    },
    /// A hole references a cell outside the grid.
    #[error("hole ({column}, {row}) lies outside the grid")]
    HoleOutOfBounds {
        /// Column of the hole.
        column: u32,
        /// Row of the hole.
        row: u32,
    },
    /// Markers and tints need at least one color.
    #[error("marker palette must list at least one color")]
    EmptyPalette,
    /// The collapse ratio is not a fraction.
    #[error("collapse ratio {0} must lie within 0..=1")]
    CollapseRatio(f32),
}

/// Complete engine configuration. Every section falls back to its defaults.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Grid dimensions and layout.
    pub grid: GridConfig,
    /// Durations, in milliseconds.
    pub timing: TimingConfig,
    /// Consolidation visuals.
    pub consolidation: ConsolidationConfig,
    /// Row regeneration.
    pub supplement: SupplementConfig,
    /// Hint behaviour.
    pub hint: HintConfig,
}

/// `[grid]` section.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Number of columns.
    pub columns: u32,
    /// Number of rows.
    pub rows: u32,
    /// Absent cells as `[column, row]` pairs.
    pub holes: Vec<[u32; 2]>,
    /// Anchor of the top-left cell.
    pub origin: [f32; 2],
    /// Distance between neighbouring anchors.
    pub spacing: [f32; 2],
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 4,
            rows: 6,
            holes: Vec::new(),
            origin: [0.0, 0.0],
            spacing: [1.0, 1.0],
        }
    }
}

impl GridConfig {
    /// Holes as cell coordinates.
    #[must_use]
    pub fn hole_cells(&self) -> Vec<CellCoord> {
        self.holes
            .iter()
            .map(|[column, row]| CellCoord::new(*column, *row))
            .collect()
    }

    /// Anchor of the top-left cell.
    #[must_use]
    pub fn origin(&self) -> Vec2 {
        Vec2::from_array(self.origin)
    }

    /// Distance between neighbouring anchors.
    #[must_use]
    pub fn spacing(&self) -> Vec2 {
        Vec2::from_array(self.spacing)
    }
}

/// `[timing]` section. All values are milliseconds.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Pause between two consolidated rows.
    pub inter_row_delay_ms: u64,
    /// Column swap.
    pub swap_ms: u64,
    /// Settle bounce after the swap.
    pub settle_ms: u64,
    /// Collapse toward the row center.
    pub collapse_ms: u64,
    /// Time a collapsed row stays visible before regenerating.
    pub display_wait_ms: u64,
    /// Marker shrinking away.
    pub marker_fade_ms: u64,
    /// Expand back to the grid slots.
    pub expand_ms: u64,
    /// Gather onto the stack column.
    pub stack_ms: u64,
    /// Pop-in and settle bounces of fresh items.
    pub bounce_ms: u64,
    /// Spread back to the grid slots.
    pub restore_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            inter_row_delay_ms: 250,
            swap_ms: 350,
            settle_ms: 200,
            collapse_ms: 300,
            display_wait_ms: 600,
            marker_fade_ms: 250,
            expand_ms: 300,
            stack_ms: 250,
            bounce_ms: 200,
            restore_ms: 300,
        }
    }
}

/// `[consolidation]` section.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConsolidationConfig {
    /// Fraction of the original spacing kept by a collapsed row.
    pub collapse_ratio: f32,
    /// Scale the settle bounce starts from.
    pub settle_scale: f32,
    /// Marker and tint colors as RGB triples.
    pub palette: Vec<[u8; 3]>,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        let defaults = consolidation::Config::default();
        Self {
            collapse_ratio: defaults.collapse_ratio,
            settle_scale: defaults.settle_scale,
            palette: defaults
                .palette
                .iter()
                .map(|color| [color.red(), color.green(), color.blue()])
                .collect(),
        }
    }
}

/// `[supplement]` section.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SupplementConfig {
    /// Number of consolidated rows that get regenerated.
    pub budget: u32,
    /// Column a regenerating row gathers onto, counted from one.
    pub stack_column: u32,
    /// Scale fresh items pop in from.
    pub bounce_scale: f32,
    /// Scale the final settle bounce starts from.
    pub settle_scale: f32,
}

impl Default for SupplementConfig {
    fn default() -> Self {
        let defaults = supplement::Config::default();
        Self {
            budget: 0,
            stack_column: defaults.stack_column,
            bounce_scale: defaults.bounce_scale,
            settle_scale: defaults.settle_scale,
        }
    }
}

/// `[hint]` section.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HintConfig {
    /// Maximum number of items highlighted by an item hint.
    pub item_cache_limit: usize,
    /// Seed of the keyword picker.
    pub seed: u64,
}

impl Default for HintConfig {
    fn default() -> Self {
        let defaults = hint::Config::default();
        Self {
            item_cache_limit: defaults.item_cache_limit,
            seed: defaults.seed,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let GridConfig { columns, rows, .. } = self.grid;
        if columns == 0 || rows == 0 {
            return Err(ConfigError::EmptyGrid { columns, rows });
        }
        if let Some([column, row]) = self
            .grid
            .holes
            .iter()
            .find(|[column, row]| *column >= columns || *row >= rows)
        {
            return Err(ConfigError::HoleOutOfBounds {
                column: *column,
                row: *row,
            });
        }
        if self.consolidation.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        let ratio = self.consolidation.collapse_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::CollapseRatio(ratio));
        }
        Ok(())
    }

    /// Pause between two consolidated rows.
    #[must_use]
    pub fn inter_row_delay(&self) -> Duration {
        Duration::from_millis(self.timing.inter_row_delay_ms)
    }

    /// Settings for the row consolidator.
    #[must_use]
    pub fn consolidation(&self) -> consolidation::Config {
        consolidation::Config {
            swap_duration: Duration::from_millis(self.timing.swap_ms),
            settle_duration: Duration::from_millis(self.timing.settle_ms),
            collapse_duration: Duration::from_millis(self.timing.collapse_ms),
            collapse_ratio: self.consolidation.collapse_ratio,
            settle_scale: self.consolidation.settle_scale,
            supplement_budget: self.supplement.budget,
            palette: self
                .consolidation
                .palette
                .iter()
                .map(|[red, green, blue]| PaletteColor::from_rgb(*red, *green, *blue))
                .collect(),
        }
    }

    /// Settings for the supplement generator.
    #[must_use]
    pub fn supplement(&self) -> supplement::Config {
        supplement::Config {
            display_wait: Duration::from_millis(self.timing.display_wait_ms),
            marker_fade_duration: Duration::from_millis(self.timing.marker_fade_ms),
            expand_duration: Duration::from_millis(self.timing.expand_ms),
            stack_duration: Duration::from_millis(self.timing.stack_ms),
            bounce_duration: Duration::from_millis(self.timing.bounce_ms),
            restore_duration: Duration::from_millis(self.timing.restore_ms),
            bounce_scale: self.supplement.bounce_scale,
            settle_scale: self.supplement.settle_scale,
            stack_column: self.supplement.stack_column,
        }
    }

    /// Settings for the hint advisor.
    #[must_use]
    pub fn hint(&self) -> hint::Config {
        hint::Config {
            item_cache_limit: self.hint.item_cache_limit,
            seed: self.hint.seed,
        }
    }
}
