//! Hydrology engine parameters and presets

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What the river tracer does when a trace runs into a cell already claimed
/// by an accepted river.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfluencePolicy {
    /// Discard the trace; the earlier river keeps the cell.
    #[default]
    Reject,
    /// Keep the trace as a tributary ending on the confluence cell.
    Merge,
}

/// River density preset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HydrologyPreset {
    /// Few, large rivers
    Sparse,
    /// Balanced network
    #[default]
    Normal,
    /// Many small rivers and creeks
    Dense,
}

impl HydrologyPreset {
    pub fn all() -> &'static [Self] {
        &[Self::Sparse, Self::Normal, Self::Dense]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Sparse => "Few, large rivers",
            Self::Normal => "Balanced river network",
            Self::Dense => "Many small rivers and creeks",
        }
    }
}

impl std::fmt::Display for HydrologyPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sparse => write!(f, "sparse"),
            Self::Normal => write!(f, "normal"),
            Self::Dense => write!(f, "dense"),
        }
    }
}

impl std::str::FromStr for HydrologyPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sparse" => Ok(Self::Sparse),
            "normal" => Ok(Self::Normal),
            "dense" => Ok(Self::Dense),
            other => Err(format!("unknown preset '{}' (expected sparse, normal or dense)", other)),
        }
    }
}

/// Hydrology engine parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrologyConfig {
    // =========================================================================
    // Discharge
    // =========================================================================

    /// Multiplier turning precipitation (0-2) into base discharge per cell
    pub precipitation_scale: f32,

    // =========================================================================
    // River formation
    // =========================================================================

    /// Discharge a cell needs to seed a river on a 10k-cell mesh.
    /// Scaled by (cells / 10000)^0.25 for other mesh densities.
    pub min_flux: f32,

    /// Threshold floor; relaxation never goes below this
    pub min_threshold: f32,

    /// Shortest accepted river, in cells (including the ocean cell it ends on)
    pub min_river_length: usize,

    /// Relax the threshold when fewer than `target_rivers` form
    pub auto_adjust: bool,

    /// River count the relaxation loop aims for
    pub target_rivers: usize,

    /// Threshold multiplier applied between attempts (0-1)
    pub relaxation_factor: f32,

    /// Total formation attempts, including the first
    pub max_attempts: usize,

    /// Cap on candidate sources per attempt
    pub max_sources: usize,

    /// Cap on steps per trace
    pub max_trace_steps: usize,

    /// Handling of traces that run into an existing river
    pub confluence: ConfluencePolicy,

    // =========================================================================
    // Lakes, deltas, seasonality
    // =========================================================================

    /// Smallest flat sink region accepted as a lake
    pub min_lake_size: usize,

    /// Pit-fill raise (height units) above which a fill counts as significant
    pub significant_fill_depth: u8,

    /// Mouth discharge needed to grow a delta
    pub delta_min_discharge: u32,

    /// BFS radius (hops) searched for delta targets around a mouth
    pub delta_radius: usize,

    /// Mean precipitation below which a river is seasonal.
    /// 0.6 is 30% of the precipitation range.
    pub seasonal_precipitation: f32,
}

impl Default for HydrologyConfig {
    fn default() -> Self {
        Self {
            precipitation_scale: 5.0,      // precipitation 1.0 -> 5 units per cell

            min_flux: 100.0,               // ~20 cells of average rain upstream
            min_threshold: 30.0,
            min_river_length: 4,
            auto_adjust: true,
            target_rivers: 8,
            relaxation_factor: 0.8,
            max_attempts: 5,
            max_sources: 500,
            max_trace_steps: 1000,
            confluence: ConfluencePolicy::Reject,

            min_lake_size: 3,
            significant_fill_depth: 2,
            delta_min_discharge: 500,
            delta_radius: 5,
            seasonal_precipitation: 0.6,
        }
    }
}

impl HydrologyConfig {
    /// Create parameters from a preset
    pub fn from_preset(preset: HydrologyPreset) -> Self {
        match preset {
            HydrologyPreset::Sparse => Self {
                min_flux: 250.0,
                min_threshold: 80.0,
                min_river_length: 6,
                target_rivers: 4,
                ..Default::default()
            },
            HydrologyPreset::Normal => Self::default(),
            HydrologyPreset::Dense => Self {
                min_flux: 50.0,
                min_threshold: 15.0,
                min_river_length: 3,
                target_rivers: 20,
                ..Default::default()
            },
        }
    }

    /// Fixed threshold, no relaxation. Useful when comparing thresholds.
    pub fn fixed(min_flux: f32) -> Self {
        Self {
            min_flux,
            min_threshold: min_flux.min(1.0),
            auto_adjust: false,
            ..Default::default()
        }
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("precipitation_scale", self.precipitation_scale)?;
        positive("min_flux", self.min_flux)?;
        positive("min_threshold", self.min_threshold)?;
        positive("seasonal_precipitation", self.seasonal_precipitation)?;

        let r = self.relaxation_factor;
        if !r.is_finite() || r <= 0.0 || r >= 1.0 {
            return Err(ConfigError::RelaxationFactor(r));
        }

        nonzero("min_river_length", self.min_river_length)?;
        nonzero("max_attempts", self.max_attempts)?;
        nonzero("max_sources", self.max_sources)?;
        nonzero("max_trace_steps", self.max_trace_steps)?;
        nonzero("min_lake_size", self.min_lake_size)?;
        Ok(())
    }

    /// Formation threshold for a mesh of `cell_count` cells, before relaxation.
    pub fn initial_threshold(&self, cell_count: usize) -> f32 {
        let density = (cell_count as f32 / 10_000.0).powf(0.25);
        (self.min_flux * density).max(self.min_threshold)
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn nonzero(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::Zero { field })
    } else {
        Ok(())
    }
}
