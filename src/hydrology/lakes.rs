//! Lake identification on flat sinks left by pit filling.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::pit_fill::PitFill;
use crate::mesh::{CellId, FeatureId, Mesh};

/// A connected flat region of river-free land at one elevation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lake {
    /// Feature id written to each cell (2 and up).
    pub id: FeatureId,
    pub cells: Vec<CellId>,
    pub elevation: u8,
    /// At least one cell was raised more than the significant fill depth.
    pub from_depression: bool,
}

impl Lake {
    pub fn size(&self) -> usize {
        self.cells.len()
    }
}

/// Land without a river whose neighbors are all at least as high.
fn is_candidate(mesh: &Mesh, id: CellId) -> bool {
    let cell = mesh.cell(id);
    cell.is_land()
        && !cell.has_river
        && cell.neighbors.iter().all(|&n| mesh.height(n) >= cell.height)
}

/// Mark ocean cells and group flat sinks into lakes of at least `min_size` cells.
pub fn identify_lakes(mesh: &mut Mesh, pit_fill: &PitFill, min_size: usize) -> Vec<Lake> {
    let mut by_elevation: BTreeMap<u8, Vec<CellId>> = BTreeMap::new();
    for id in mesh.ids() {
        if mesh.is_ocean(id) {
            mesh.cell_mut(id).feature = FeatureId::OCEAN;
        } else if is_candidate(mesh, id) {
            by_elevation.entry(mesh.height(id)).or_default().push(id);
        }
    }

    let mut in_group = vec![false; mesh.len()];
    let mut visited = vec![false; mesh.len()];
    let mut lakes = Vec::new();
    let mut next_id = FeatureId::FIRST_LAKE.0;

    for (&elevation, group) in &by_elevation {
        for &id in group {
            in_group[id as usize] = true;
        }

        for &start in group {
            if visited[start as usize] {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            visited[start as usize] = true;
            while let Some(id) = queue.pop_front() {
                component.push(id);
                for &n in mesh.neighbors(id) {
                    if in_group[n as usize] && !visited[n as usize] {
                        visited[n as usize] = true;
                        queue.push_back(n);
                    }
                }
            }

            if component.len() < min_size {
                continue;
            }
            if next_id == u16::MAX {
                break;
            }
            let id = FeatureId(next_id);
            next_id += 1;

            component.sort_unstable();
            for &cell in &component {
                mesh.cell_mut(cell).feature = id;
            }
            lakes.push(Lake {
                id,
                from_depression: component.iter().any(|&c| pit_fill.is_significant(c)),
                cells: component,
                elevation,
            });
        }

        for &id in group {
            in_group[id as usize] = false;
        }
    }

    lakes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrology::{fill_pits, CancelToken};
    use crate::synthetic::{hex_index, hex_lattice};

    /// Ocean ring around land ramping up eastward (40 + 3 per column), with
    /// one or more enclosed basins cut into it.
    fn ramp_with_basins(width: usize, height: usize, basins: &[(usize, usize, u8)]) -> Mesh {
        hex_lattice(width, height, |col, row, _| {
            let border = col == 0 || row == 0 || col == width - 1 || row == height - 1;
            if border {
                return (5, 1.0);
            }
            for &(bc, br, h) in basins {
                if (bc..=bc + 2).contains(&col) && (br..=br + 2).contains(&row) {
                    return (h, 1.0);
                }
            }
            (40 + 3 * col as u8, 1.0)
        })
        .unwrap()
    }

    #[test]
    fn test_filled_basin_becomes_lake() {
        let mut mesh = ramp_with_basins(11, 11, &[(4, 4, 25)]);
        let fill = fill_pits(&mut mesh, 2, &CancelToken::new()).unwrap();
        let lakes = identify_lakes(&mut mesh, &fill, 3);

        assert_eq!(lakes.len(), 1);
        let lake = &lakes[0];
        assert_eq!(lake.id, FeatureId::FIRST_LAKE);
        // Spills over the column-3 rim at 49
        assert_eq!(lake.elevation, 49);
        assert_eq!(lake.size(), 9);
        assert!(lake.from_depression);
        assert!(lake.cells.contains(&hex_index(11, 5, 5)));
        for &cell in &lake.cells {
            assert_eq!(mesh.cell(cell).feature, lake.id);
        }
        for id in mesh.ids().filter(|&id| mesh.is_ocean(id)) {
            assert!(mesh.cell(id).feature.is_ocean());
        }
    }

    #[test]
    fn test_small_sinks_and_river_cells_skipped() {
        let mut mesh = ramp_with_basins(11, 11, &[(4, 4, 25)]);
        let fill = fill_pits(&mut mesh, 2, &CancelToken::new()).unwrap();
        assert!(identify_lakes(&mut mesh.clone(), &fill, 10).is_empty());

        for id in mesh.ids() {
            if fill.raised[id as usize] > 0 {
                mesh.cell_mut(id).has_river = true;
            }
        }
        assert!(identify_lakes(&mut mesh, &fill, 3).is_empty());
    }

    #[test]
    fn test_separate_flats_get_distinct_ids() {
        let mut mesh = ramp_with_basins(15, 9, &[(2, 3, 30), (10, 3, 40)]);
        let fill = fill_pits(&mut mesh, 2, &CancelToken::new()).unwrap();
        let lakes = identify_lakes(&mut mesh, &fill, 3);
        assert_eq!(lakes.len(), 2);
        assert_eq!(lakes[0].id, FeatureId(2));
        assert_eq!(lakes[1].id, FeatureId(3));
        assert!(lakes[0].elevation < lakes[1].elevation);
        assert_eq!(lakes[0].size(), 9);
        assert_eq!(lakes[1].size(), 9);
    }

    #[test]
    fn test_shallow_flat_is_not_from_depression() {
        // Basin only 1 below its rim
        let mut mesh = ramp_with_basins(11, 11, &[(4, 4, 48)]);
        let fill = fill_pits(&mut mesh, 2, &CancelToken::new()).unwrap();
        let lakes = identify_lakes(&mut mesh, &fill, 3);
        assert_eq!(lakes.len(), 1);
        assert!(!lakes[0].from_depression);
    }
}
