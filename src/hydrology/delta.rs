//! Distributary channels at high-discharge river mouths.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rivers::{Outlet, River, RiverId};
use crate::config::HydrologyConfig;
use crate::mesh::{CellId, Mesh};

/// Channels fanned out from one river mouth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub river: RiverId,
    pub mouth: CellId,
    /// Cells walked by each channel, mouth excluded.
    pub channels: Vec<Vec<CellId>>,
}

/// 2 channels at the minimum discharge, 3 at twice it, 4 at four times.
pub fn channel_count(mouth_discharge: u32, min_discharge: u32) -> usize {
    let min = min_discharge.max(1) as u64;
    let q = mouth_discharge as u64;
    if q >= min * 4 {
        4
    } else if q >= min * 2 {
        3
    } else {
        2
    }
}

/// Coastal land cells within `radius` land hops of `mouth`, farthest first.
fn coastal_targets(mesh: &Mesh, mouth: CellId, radius: usize) -> Vec<(usize, CellId)> {
    let mut dist = vec![usize::MAX; mesh.len()];
    let mut queue = VecDeque::from([mouth]);
    dist[mouth as usize] = 0;
    let mut found = Vec::new();

    while let Some(id) = queue.pop_front() {
        let d = dist[id as usize];
        if d > 0 && mesh.is_coastal(id) {
            found.push((d, id));
        }
        if d == radius {
            continue;
        }
        for &n in mesh.neighbors(id) {
            if mesh.is_land(n) && dist[n as usize] == usize::MAX {
                dist[n as usize] = d + 1;
                queue.push_back(n);
            }
        }
    }

    found.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    found
}

/// Greedy walk from `mouth` over unvisited land toward `target`.
fn walk_channel(mesh: &Mesh, mouth: CellId, target: CellId, max_steps: usize) -> Vec<CellId> {
    let mut path = Vec::new();
    let mut visited = vec![mouth];
    let mut current = mouth;

    for _ in 0..max_steps {
        let next = mesh
            .neighbors(current)
            .iter()
            .copied()
            .filter(|&n| mesh.is_land(n) && !visited.contains(&n))
            .min_by(|&a, &b| {
                mesh.distance_sq(a, target)
                    .total_cmp(&mesh.distance_sq(b, target))
                    .then(a.cmp(&b))
            });
        let Some(next) = next else {
            break;
        };
        visited.push(next);
        path.push(next);
        if next == target {
            break;
        }
        current = next;
    }
    path
}

/// Grow deltas for every ocean-bound river whose mouth discharge is high
/// enough and that reaches at least two coastal cells. Channel cells get
/// `has_river`; river cell lists are left alone.
pub fn generate_deltas(mesh: &mut Mesh, rivers: &[River], config: &HydrologyConfig) -> Vec<Delta> {
    let mut deltas = Vec::new();

    for river in rivers {
        if river.outlet != Outlet::Ocean || river.mouth_discharge < config.delta_min_discharge {
            continue;
        }
        let count = channel_count(river.mouth_discharge, config.delta_min_discharge);
        let targets = coastal_targets(mesh, river.mouth, config.delta_radius);

        let channels: Vec<Vec<CellId>> = targets
            .iter()
            .take(count)
            .map(|&(_, target)| walk_channel(mesh, river.mouth, target, config.delta_radius * 2))
            .filter(|c| !c.is_empty())
            .collect();
        // A single channel is just the river continuing
        if channels.len() < 2 {
            continue;
        }

        for &cell in channels.iter().flatten() {
            mesh.cell_mut(cell).has_river = true;
        }
        debug!(river = river.id.0, channels = channels.len(), "delta formed");
        deltas.push(Delta {
            river: river.id,
            mouth: river.mouth,
            channels,
        });
    }

    deltas
}
