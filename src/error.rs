//! Error types for mesh construction, configuration and engine runs.

use thiserror::Error;

use crate::hydrology::Stage;
use crate::mesh::CellId;

/// Errors raised while assembling a [`Mesh`](crate::mesh::Mesh) from raw cells.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("cell {cell} lists neighbor {neighbor}, but the mesh only has {len} cells")]
    NeighborOutOfRange {
        cell: CellId,
        neighbor: CellId,
        len: usize,
    },
    #[error("cell {cell} lists itself as a neighbor")]
    SelfNeighbor { cell: CellId },
    #[error("cell {cell} lists neighbor {neighbor} more than once")]
    DuplicateNeighbor { cell: CellId, neighbor: CellId },
    #[error("cell {cell} lists {neighbor} as a neighbor, but {neighbor} does not list {cell}")]
    AsymmetricAdjacency { cell: CellId, neighbor: CellId },
    #[error("cell {cell} has height {height}, above the maximum of 100")]
    HeightOutOfRange { cell: CellId, height: u8 },
    #[error("cell {cell} has precipitation {value}, outside 0..=2")]
    PrecipitationOutOfRange { cell: CellId, value: f32 },
}

/// Errors raised by [`HydrologyConfig::validate`](crate::config::HydrologyConfig::validate).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite positive number, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("relaxation factor must lie strictly between 0 and 1, got {0}")]
    RelaxationFactor(f32),
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
}

/// Errors returned by [`HydrologyEngine::generate`](crate::hydrology::HydrologyEngine::generate).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HydrologyError {
    #[error("invalid hydrology config: {0}")]
    Config(#[from] ConfigError),
    #[error("hydrology run cancelled during {stage}")]
    Cancelled { stage: Stage },
}
