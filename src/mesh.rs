//! Irregular planar mesh of cells with symmetric adjacency.
//!
//! Cells are stored densely and addressed by [`CellId`], which is always the
//! cell's index in the table. Ocean status is derived on construction by
//! flood-filling water cells from the map border, so an enclosed inland
//! depression below sea level is not ocean and gets filled like any other pit.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// Dense cell index.
pub type CellId = u32;

/// Highest valid cell height.
pub const MAX_HEIGHT: u8 = 100;

/// Cells at or above this height are dry land.
pub const LAND_HEIGHT: u8 = 20;

/// Upper bound of the precipitation field.
pub const MAX_PRECIPITATION: f32 = 2.0;

/// Feature marker stored on each cell (0 = none, 1 = ocean, 2+ = lake id).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub u16);

impl FeatureId {
    pub const NONE: FeatureId = FeatureId(0);
    pub const OCEAN: FeatureId = FeatureId(1);
    pub const FIRST_LAKE: FeatureId = FeatureId(2);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    pub fn is_ocean(&self) -> bool {
        self.0 == 1
    }

    pub fn is_lake(&self) -> bool {
        self.0 > 1
    }
}

/// A single mesh cell.
///
/// Inputs are `height`, `neighbors`, `position`, `is_border` and
/// `precipitation`. Everything from `has_river` down is written by the
/// hydrology engine.
#[derive(Clone, Debug)]
pub struct Cell {
    pub id: CellId,
    pub height: u8,
    pub neighbors: Vec<CellId>,
    pub position: [f32; 2],
    pub is_border: bool,
    pub precipitation: f32,

    pub has_river: bool,
    /// Id of the river claiming this cell, 0 when none.
    pub river_id: u32,
    /// Accumulated discharge.
    pub flux: u32,
    pub feature: FeatureId,
    /// Hops to the coastline: positive on land, negative at sea, 0 when unset.
    pub coast_distance: i8,
    /// Nearest ocean neighbor of a coastal land cell.
    pub haven: Option<CellId>,
    /// Number of ocean neighbors of a coastal land cell.
    pub harbor: u8,

    ocean: bool,
}

impl Cell {
    pub fn new(height: u8, neighbors: Vec<CellId>) -> Self {
        Self {
            id: 0,
            height,
            neighbors,
            position: [0.0, 0.0],
            is_border: false,
            precipitation: 1.0,
            has_river: false,
            river_id: 0,
            flux: 0,
            feature: FeatureId::NONE,
            coast_distance: 0,
            haven: None,
            harbor: 0,
            ocean: false,
        }
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    pub fn with_border(mut self, is_border: bool) -> Self {
        self.is_border = is_border;
        self
    }

    pub fn with_precipitation(mut self, precipitation: f32) -> Self {
        self.precipitation = precipitation;
        self
    }

    /// Water connected to the map border.
    pub fn is_ocean(&self) -> bool {
        self.ocean
    }

    pub fn is_land(&self) -> bool {
        !self.ocean
    }
}

/// Validated cell table.
#[derive(Clone, Debug)]
pub struct Mesh {
    cells: Vec<Cell>,
}

impl Mesh {
    /// Build a mesh, assigning ids by position and validating adjacency and
    /// input ranges. Ocean flags are derived here.
    pub fn new(mut cells: Vec<Cell>) -> Result<Self, MeshError> {
        let len = cells.len();
        for (idx, cell) in cells.iter_mut().enumerate() {
            cell.id = idx as CellId;
        }

        for cell in &cells {
            if cell.height > MAX_HEIGHT {
                return Err(MeshError::HeightOutOfRange { cell: cell.id, height: cell.height });
            }
            let p = cell.precipitation;
            if !p.is_finite() || !(0.0..=MAX_PRECIPITATION).contains(&p) {
                return Err(MeshError::PrecipitationOutOfRange { cell: cell.id, value: p });
            }
            for (i, &n) in cell.neighbors.iter().enumerate() {
                if n as usize >= len {
                    return Err(MeshError::NeighborOutOfRange { cell: cell.id, neighbor: n, len });
                }
                if n == cell.id {
                    return Err(MeshError::SelfNeighbor { cell: cell.id });
                }
                if cell.neighbors[..i].contains(&n) {
                    return Err(MeshError::DuplicateNeighbor { cell: cell.id, neighbor: n });
                }
                if !cells[n as usize].neighbors.contains(&cell.id) {
                    return Err(MeshError::AsymmetricAdjacency { cell: cell.id, neighbor: n });
                }
            }
        }

        let mut mesh = Self { cells };
        mesh.mark_ocean();
        Ok(mesh)
    }

    /// Flood-fill water from border water cells; everything reached is ocean.
    fn mark_ocean(&mut self) {
        let mut queue = VecDeque::new();
        for cell in &mut self.cells {
            cell.ocean = false;
        }
        for idx in 0..self.cells.len() {
            let cell = &mut self.cells[idx];
            if cell.is_border && cell.height < LAND_HEIGHT {
                cell.ocean = true;
                queue.push_back(idx);
            }
        }

        while let Some(idx) = queue.pop_front() {
            for k in 0..self.cells[idx].neighbors.len() {
                let n = self.cells[idx].neighbors[k] as usize;
                let neighbor = &mut self.cells[n];
                if !neighbor.ocean && neighbor.height < LAND_HEIGHT {
                    neighbor.ocean = true;
                    queue.push_back(n);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = CellId> {
        0..self.cells.len() as CellId
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id as usize]
    }

    pub fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id as usize]
    }

    pub fn height(&self, id: CellId) -> u8 {
        self.cells[id as usize].height
    }

    pub fn neighbors(&self, id: CellId) -> &[CellId] {
        &self.cells[id as usize].neighbors
    }

    pub fn is_ocean(&self, id: CellId) -> bool {
        self.cells[id as usize].ocean
    }

    pub fn is_land(&self, id: CellId) -> bool {
        !self.cells[id as usize].ocean
    }

    pub fn is_border(&self, id: CellId) -> bool {
        self.cells[id as usize].is_border
    }

    /// Land cell with at least one ocean neighbor.
    pub fn is_coastal(&self, id: CellId) -> bool {
        self.is_land(id) && self.neighbors(id).iter().any(|&n| self.is_ocean(n))
    }

    pub fn land_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_land()).count()
    }

    /// Squared planar distance between two cell centers.
    pub fn distance_sq(&self, a: CellId, b: CellId) -> f32 {
        let pa = self.cells[a as usize].position;
        let pb = self.cells[b as usize].position;
        let dx = pa[0] - pb[0];
        let dy = pa[1] - pb[1];
        dx * dx + dy * dy
    }

    /// Clear every engine output so the mesh can be run again.
    pub fn reset_outputs(&mut self) {
        for cell in &mut self.cells {
            cell.has_river = false;
            cell.river_id = 0;
            cell.flux = 0;
            cell.feature = FeatureId::NONE;
            cell.coast_distance = 0;
            cell.haven = None;
            cell.harbor = 0;
        }
    }
}
