//! Coast distance, havens and harbors.
//!
//! Distances are hop counts from the coastline found by a multi-source BFS:
//! land cells count up from 1 at the shore, ocean cells count down from -1.
//! Cells the BFS never reaches (a mesh with no coast) keep 0.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::mesh::{CellId, Mesh};

/// Totals from coast markup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoastSummary {
    /// Land cells with at least one ocean neighbor
    pub coastal_cells: usize,
    /// Coastal cells with more than one ocean neighbor
    pub harbors: usize,
    /// Largest land distance reached
    pub max_inland: i8,
    /// Deepest ocean distance reached (negative)
    pub max_offshore: i8,
}

/// BFS from `seeds` through cells of the same side, stepping the distance by `step`.
fn flood_distance(mesh: &mut Mesh, seeds: Vec<CellId>, land: bool, step: i8) {
    let mut queue: VecDeque<CellId> = seeds.into();
    while let Some(id) = queue.pop_front() {
        let next = mesh.cell(id).coast_distance.saturating_add(step);
        for k in 0..mesh.neighbors(id).len() {
            let n = mesh.neighbors(id)[k];
            let cell = mesh.cell_mut(n);
            if cell.is_land() == land && cell.coast_distance == 0 {
                cell.coast_distance = next;
                queue.push_back(n);
            }
        }
    }
}

/// Write `coast_distance`, `haven` and `harbor` on every cell.
pub fn mark_coast(mesh: &mut Mesh) -> CoastSummary {
    let mut shore = Vec::new();
    let mut sea = Vec::new();

    for id in mesh.ids() {
        let land = mesh.is_land(id);
        let touches_other = mesh.neighbors(id).iter().any(|&n| mesh.is_land(n) != land);
        if !touches_other {
            continue;
        }
        if land {
            mesh.cell_mut(id).coast_distance = 1;
            shore.push(id);
        } else {
            mesh.cell_mut(id).coast_distance = -1;
            sea.push(id);
        }
    }

    let mut summary = CoastSummary::default();
    for &id in &shore {
        let mut haven: Option<CellId> = None;
        let mut harbor = 0u8;
        for &n in mesh.neighbors(id) {
            if !mesh.is_ocean(n) {
                continue;
            }
            harbor = harbor.saturating_add(1);
            let closer = match haven {
                None => true,
                Some(h) => mesh.distance_sq(id, n) < mesh.distance_sq(id, h),
            };
            if closer {
                haven = Some(n);
            }
        }
        let cell = mesh.cell_mut(id);
        cell.haven = haven;
        cell.harbor = harbor;
        summary.coastal_cells += 1;
        if harbor > 1 {
            summary.harbors += 1;
        }
    }

    flood_distance(mesh, shore, true, 1);
    flood_distance(mesh, sea, false, -1);

    for cell in mesh.cells() {
        summary.max_inland = summary.max_inland.max(cell.coast_distance);
        summary.max_offshore = summary.max_offshore.min(cell.coast_distance);
    }
    summary
}
