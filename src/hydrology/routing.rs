//! Single-direction flow routing on the mesh adjacency graph.
//!
//! Each land cell drains to its steepest strictly-lower neighbor. Cells on
//! flats (no strictly lower neighbor) are resolved breadth-first from the flat's
//! exits: a flat cell drains to a same-height neighbor that is already resolved,
//! starting with neighbors that have a strict descent (two-hop lookahead) and
//! expanding one hop at a time. Border land cells without a descent drain off
//! the map edge and count as exits too. Every zero-drop edge therefore points
//! one step closer to an exit, so flats never produce a cycle.

use std::collections::VecDeque;

use crate::mesh::{CellId, Mesh};

/// Sentinel for "no downstream neighbor" (ocean cells and unresolved sinks).
pub const NO_FLOW: CellId = CellId::MAX;

/// Dense downstream table plus each cell's hop count to its flat exit.
#[derive(Clone, Debug)]
pub struct FlowDirections {
    downstream: Vec<CellId>,
    flat_depth: Vec<u32>,
}

impl FlowDirections {
    /// Downstream neighbor of `id`, if any.
    pub fn get(&self, id: CellId) -> Option<CellId> {
        match self.downstream[id as usize] {
            NO_FLOW => None,
            d => Some(d),
        }
    }

    /// Raw table with `NO_FLOW` sentinels.
    pub fn as_slice(&self) -> &[CellId] {
        &self.downstream
    }

    /// 0 for cells with a strict descent, k for a flat cell k hops from its exit.
    pub fn flat_depth(&self, id: CellId) -> u32 {
        self.flat_depth[id as usize]
    }

    /// Cells routed across a flat.
    pub fn flat_routed(&self) -> usize {
        self.flat_depth.iter().filter(|&&d| d > 0).count()
    }

    /// Interior land cells left without a direction. Border land outlets
    /// drain off the map and are not counted.
    pub fn unresolved_land(&self, mesh: &Mesh) -> usize {
        mesh.ids()
            .filter(|&id| mesh.is_land(id) && !mesh.is_border(id) && self.get(id).is_none())
            .count()
    }
}

/// Compute the downstream neighbor of every cell.
pub fn route_flow(mesh: &Mesh) -> FlowDirections {
    let n = mesh.len();
    let mut downstream = vec![NO_FLOW; n];
    let mut flat_depth = vec![0u32; n];
    let mut resolved = vec![false; n];

    // Steepest descent
    for id in mesh.ids() {
        if mesh.is_ocean(id) {
            continue;
        }
        let h = mesh.height(id);
        let mut best: Option<CellId> = None;
        let mut best_drop = 0u8;
        for &neighbor in mesh.neighbors(id) {
            let nh = mesh.height(neighbor);
            if nh < h && h - nh > best_drop {
                best_drop = h - nh;
                best = Some(neighbor);
            }
        }
        if let Some(target) = best {
            downstream[id as usize] = target;
            resolved[id as usize] = true;
        }
    }

    // Flat resolution, seeded with every land cell that has a strict descent
    // plus border land outlets, which keep NO_FLOW but act as exits at depth 0
    let mut queue: VecDeque<CellId> = mesh
        .ids()
        .filter(|&id| resolved[id as usize] || (mesh.is_land(id) && mesh.is_border(id)))
        .collect();
    for &id in &queue {
        resolved[id as usize] = true;
    }

    while let Some(exit) = queue.pop_front() {
        let h = mesh.height(exit);
        let depth = flat_depth[exit as usize] + 1;
        for &neighbor in mesh.neighbors(exit) {
            let idx = neighbor as usize;
            if resolved[idx] || mesh.is_ocean(neighbor) || mesh.height(neighbor) != h {
                continue;
            }
            downstream[idx] = exit;
            flat_depth[idx] = depth;
            resolved[idx] = true;
            queue.push_back(neighbor);
        }
    }

    FlowDirections {
        downstream,
        flat_depth,
    }
}
