//! Priority-Flood depression filling.
//!
//! Floods inward from every ocean and map-border cell in increasing elevation
//! order. A cell first reached at a level above its own height sits in a
//! depression and is raised to that level, so afterwards every reachable cell
//! has a non-ascending path to an outlet.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::warn;

use super::{CancelToken, Stage};
use crate::error::HydrologyError;
use crate::mesh::{CellId, Mesh};

/// Pops between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Result of pit filling.
#[derive(Clone, Debug)]
pub struct PitFill {
    /// Level at which the flood front first reached each cell (None if never).
    pub flood_level: Vec<Option<u8>>,
    /// Height added to each cell.
    pub raised: Vec<u8>,
    /// Cells whose raise exceeded the significant depth.
    pub significant: Vec<bool>,
}

impl PitFill {
    pub fn raised_count(&self) -> usize {
        self.raised.iter().filter(|&&r| r > 0).count()
    }

    pub fn significant_count(&self) -> usize {
        self.significant.iter().filter(|&&s| s).count()
    }

    pub fn is_significant(&self, id: CellId) -> bool {
        self.significant[id as usize]
    }

    pub fn unreachable_count(&self) -> usize {
        self.flood_level.iter().filter(|l| l.is_none()).count()
    }
}

/// Fill every depression not open to an outlet.
///
/// Cells in regions with no ocean or border cell are left untouched.
pub fn fill_pits(
    mesh: &mut Mesh,
    significant_depth: u8,
    cancel: &CancelToken,
) -> Result<PitFill, HydrologyError> {
    let n = mesh.len();
    let mut flood_level: Vec<Option<u8>> = vec![None; n];
    let mut raised = vec![0u8; n];
    let mut significant = vec![false; n];

    // Min-heap on (level, id); id breaks ties deterministically
    let mut heap = BinaryHeap::new();
    for id in mesh.ids() {
        if mesh.is_ocean(id) || mesh.is_border(id) {
            heap.push(Reverse((mesh.height(id), id)));
        }
    }

    let mut pops = 0usize;
    while let Some(Reverse((level, id))) = heap.pop() {
        pops += 1;
        if pops % CANCEL_CHECK_INTERVAL == 0 {
            cancel.check(Stage::PitFill)?;
        }

        let idx = id as usize;
        if flood_level[idx].is_some() {
            continue;
        }
        flood_level[idx] = Some(level);

        let cell = mesh.cell_mut(id);
        if cell.height < level {
            let raise = level - cell.height;
            cell.height = level;
            raised[idx] = raise;
            significant[idx] = raise > significant_depth;
        }

        let current = mesh.height(id);
        for &neighbor in mesh.neighbors(id) {
            if flood_level[neighbor as usize].is_none() {
                heap.push(Reverse((mesh.height(neighbor).max(current), neighbor)));
            }
        }
    }

    let unreachable = flood_level.iter().filter(|l| l.is_none()).count();
    if unreachable > 0 {
        warn!(unreachable, "cells not reachable from any ocean or border cell; left unfilled");
    }

    Ok(PitFill {
        flood_level,
        raised,
        significant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Cell;
    use crate::synthetic::{hex_index, hex_lattice};

    #[test]
    fn test_single_pit_is_raised_and_significant() {
        // Ocean ring, plateau at 50, one pit at 10 in the middle
        let center = hex_index(7, 3, 3);
        let mut mesh = hex_lattice(7, 7, |col, row, _| {
            let border = col == 0 || row == 0 || col == 6 || row == 6;
            if border {
                (5, 1.0)
            } else if (col, row) == (3, 3) {
                (10, 1.0)
            } else {
                (50, 1.0)
            }
        })
        .unwrap();
        assert!(mesh.neighbors(center).iter().all(|&n| mesh.height(n) == 50));

        let fill = fill_pits(&mut mesh, 2, &CancelToken::new()).unwrap();
        assert_eq!(mesh.height(center), 50);
        assert_eq!(fill.raised[center as usize], 40);
        assert!(fill.is_significant(center));
        assert_eq!(fill.significant_count(), 1);
        assert_eq!(fill.unreachable_count(), 0);
    }

    #[test]
    fn test_no_cell_below_flood_level() {
        let mut mesh = crate::synthetic::noisy_island(40, 30, 11).unwrap();
        let fill = fill_pits(&mut mesh, 2, &CancelToken::new()).unwrap();
        for id in mesh.ids() {
            if let Some(level) = fill.flood_level[id as usize] {
                assert!(mesh.height(id) >= level, "cell {} below its flood level", id);
            }
        }
    }

    #[test]
    fn test_shallow_fill_not_significant() {
        // Line: ocean, 30, 28 (pit), 30, border 40
        let heights = [5u8, 30, 28, 30, 40];
        let cells: Vec<Cell> = (0..heights.len())
            .map(|i| {
                let mut neighbors = Vec::new();
                if i > 0 {
                    neighbors.push(i as CellId - 1);
                }
                if i + 1 < heights.len() {
                    neighbors.push(i as CellId + 1);
                }
                Cell::new(heights[i], neighbors).with_border(i == 0 || i == heights.len() - 1)
            })
            .collect();
        let mut mesh = Mesh::new(cells).unwrap();
        let fill = fill_pits(&mut mesh, 2, &CancelToken::new()).unwrap();
        assert_eq!(mesh.height(2), 30);
        assert_eq!(fill.raised[2], 2);
        assert!(!fill.is_significant(2));
    }

    #[test]
    fn test_enclosed_region_left_untouched() {
        // Two cells with no border or ocean anywhere
        let cells = vec![Cell::new(40, vec![1]), Cell::new(25, vec![0])];
        let mut mesh = Mesh::new(cells).unwrap();
        let fill = fill_pits(&mut mesh, 2, &CancelToken::new()).unwrap();
        assert_eq!(mesh.height(1), 25);
        assert_eq!(fill.unreachable_count(), 2);
    }

    #[test]
    fn test_cancelled_token_stops_long_flood() {
        let mut mesh = crate::synthetic::noisy_island(80, 80, 3).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = fill_pits(&mut mesh, 2, &cancel).unwrap_err();
        assert_eq!(err, HydrologyError::Cancelled { stage: Stage::PitFill });
    }
}
