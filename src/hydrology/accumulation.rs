//! Discharge accumulation along the flow forest.

use std::cmp::Reverse;

use super::routing::FlowDirections;
use crate::mesh::{Cell, CellId, Mesh};

/// Cells ordered so that every cell comes before its downstream neighbor.
///
/// Sorted by descending height, then descending flat depth, then id. Heights
/// do not change after pit filling, so one permutation serves the whole run.
#[derive(Clone, Debug)]
pub struct DrainageOrder(Vec<CellId>);

impl DrainageOrder {
    pub fn new(mesh: &Mesh, directions: &FlowDirections) -> Self {
        let mut order: Vec<CellId> = mesh.ids().collect();
        order.sort_by_key(|&id| (Reverse(mesh.height(id)), Reverse(directions.flat_depth(id)), id));
        Self(order)
    }

    pub fn as_slice(&self) -> &[CellId] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = CellId> + '_ {
        self.0.iter().copied()
    }
}

/// Per-cell accumulated discharge and the base discharge it started from.
#[derive(Clone, Debug)]
pub struct FlowAccumulation {
    discharge: Vec<u32>,
    base: Vec<u32>,
}

impl FlowAccumulation {
    pub fn get(&self, id: CellId) -> u32 {
        self.discharge[id as usize]
    }

    pub fn base(&self, id: CellId) -> u32 {
        self.base[id as usize]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.discharge
    }

    pub fn max(&self) -> u32 {
        self.discharge.iter().copied().max().unwrap_or(0)
    }
}

/// Rain falling on a single cell: at least 1 on land, 0 at sea.
pub fn base_discharge(cell: &Cell, precipitation_scale: f32) -> u32 {
    if cell.is_ocean() {
        0
    } else {
        (cell.precipitation * precipitation_scale).round().max(1.0) as u32
    }
}

/// Push every cell's discharge into its downstream neighbor in drainage order
/// and store the result in each cell's `flux`.
pub fn accumulate_flow(
    mesh: &mut Mesh,
    directions: &FlowDirections,
    order: &DrainageOrder,
    precipitation_scale: f32,
) -> FlowAccumulation {
    let base: Vec<u32> = mesh
        .cells()
        .iter()
        .map(|c| base_discharge(c, precipitation_scale))
        .collect();
    let mut discharge = base.clone();

    for id in order.iter() {
        let Some(down) = directions.get(id) else {
            continue;
        };
        if mesh.is_ocean(down) {
            continue;
        }
        let upstream = discharge[id as usize];
        let target = &mut discharge[down as usize];
        *target = target.saturating_add(upstream);
    }

    for (cell, &flux) in mesh.cells_mut().iter_mut().zip(&discharge) {
        cell.flux = flux;
    }

    FlowAccumulation { discharge, base }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrology::{fill_pits, route_flow, CancelToken};
    use crate::synthetic::noisy_island;

    fn prepared(width: usize, height: usize, seed: u64) -> (Mesh, FlowDirections, DrainageOrder) {
        let mut mesh = noisy_island(width, height, seed).unwrap();
        fill_pits(&mut mesh, 2, &CancelToken::new()).unwrap();
        let dirs = route_flow(&mesh);
        let order = DrainageOrder::new(&mesh, &dirs);
        (mesh, dirs, order)
    }

    #[test]
    fn test_order_is_topological() {
        let (mesh, dirs, order) = prepared(48, 40, 21);
        let mut position = vec![0usize; mesh.len()];
        for (i, id) in order.iter().enumerate() {
            position[id as usize] = i;
        }
        for id in mesh.ids() {
            if let Some(down) = dirs.get(id) {
                assert!(position[id as usize] < position[down as usize],
                    "cell {} processed after its downstream {}", id, down);
            }
        }
    }

    #[test]
    fn test_accumulation_at_least_base_and_increases_downstream() {
        let (mut mesh, dirs, order) = prepared(48, 40, 8);
        let acc = accumulate_flow(&mut mesh, &dirs, &order, 5.0);
        for id in mesh.ids() {
            assert!(acc.get(id) >= acc.base(id));
            assert_eq!(mesh.cell(id).flux, acc.get(id));
            if let Some(down) = dirs.get(id) {
                if mesh.is_land(down) {
                    assert!(acc.get(down) > acc.get(id));
                }
            }
        }
    }

    #[test]
    fn test_land_discharge_conserved_at_outlets() {
        // Every unit of rain ends up in exactly one terminal land cell
        let (mut mesh, dirs, order) = prepared(32, 32, 4);
        let acc = accumulate_flow(&mut mesh, &dirs, &order, 5.0);
        let total_rain: u64 = mesh.ids().map(|id| acc.base(id) as u64).sum();
        let at_outlets: u64 = mesh
            .ids()
            .filter(|&id| mesh.is_land(id))
            .filter(|&id| match dirs.get(id) {
                None => true,
                Some(down) => mesh.is_ocean(down),
            })
            .map(|id| acc.get(id) as u64)
            .sum();
        assert_eq!(total_rain, at_outlets);
    }

    #[test]
    fn test_base_discharge_floor() {
        let dry = Cell::new(40, Vec::new()).with_precipitation(0.0);
        assert_eq!(base_discharge(&dry, 5.0), 1);
        let wet = Cell::new(40, Vec::new()).with_precipitation(2.0);
        assert_eq!(base_discharge(&wet, 5.0), 10);
    }
}
