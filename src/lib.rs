//! Mesh hydrology library
//!
//! Builds a drainage network (flow directions, discharge, rivers, lakes,
//! deltas) over an irregular cell mesh. Re-exports modules for use by the
//! binary and tools.

pub mod config;
pub mod error;
pub mod export;
pub mod hydrology;
pub mod mesh;
pub mod naming;
pub mod report;
pub mod synthetic;

pub use config::{ConfluencePolicy, HydrologyConfig, HydrologyPreset};
pub use error::{ConfigError, HydrologyError, MeshError};
pub use hydrology::{CancelToken, Hydrology, HydrologyEngine, Stage};
pub use mesh::{Cell, CellId, FeatureId, Mesh};
