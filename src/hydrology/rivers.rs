//! River tracing with self-correcting formation threshold.
//!
//! Sources are the highest-discharge land cells above a threshold that scales
//! with mesh density. Each unclaimed source is walked downstream along the flow
//! directions until it reaches the sea, leaves the map edge, runs into a cell
//! claimed by an earlier river, or dead-ends. Accepted traces claim their cells.
//!
//! Formation at one threshold ([`form_rivers`]) does not touch the mesh. The
//! retry loop ([`trace_rivers`]) lowers the threshold until enough rivers form,
//! and only the settled result is written back by [`apply_rivers`].

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::accumulation::FlowAccumulation;
use super::routing::FlowDirections;
use super::{CancelToken, Stage};
use crate::config::{ConfluencePolicy, HydrologyConfig};
use crate::error::HydrologyError;
use crate::mesh::{CellId, Mesh};

/// River identifier (0 is reserved for "no river" on cells).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RiverId(pub u32);

/// Width band of a river.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RiverType {
    #[default]
    Stream,
    River,
    MajorRiver,
}

impl RiverType {
    pub fn display_name(&self) -> &'static str {
        match self {
            RiverType::Stream => "Stream",
            RiverType::River => "River",
            RiverType::MajorRiver => "Major river",
        }
    }
}

/// Where a river ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outlet {
    /// Last cell is the ocean cell the river drains into
    Ocean,
    /// Last cell is a border land cell with no downstream neighbor
    MapEdge,
    /// Last cell belongs to the parent river
    Confluence,
}

/// An accepted river.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct River {
    pub id: RiverId,
    /// Source first; simple path with no repeated cell.
    pub cells: Vec<CellId>,
    pub source: CellId,
    /// Last cell owned by this river.
    pub mouth: CellId,
    pub outlet: Outlet,
    /// River this one flows into (merge policy only).
    pub parent: Option<RiverId>,
    pub width: f32,
    pub length: usize,
    pub kind: RiverType,
    pub is_seasonal: bool,
    pub name: String,
    /// Highest discharge along the river's own cells.
    pub max_discharge: u32,
    pub mouth_discharge: u32,
}

/// A trace accepted at one threshold, before ids are assigned.
#[derive(Clone, Debug, PartialEq)]
pub struct TracedRiver {
    pub cells: Vec<CellId>,
    pub outlet: Outlet,
    /// Index of the parent within the same formation.
    pub parent: Option<usize>,
}

/// Rivers formed at one threshold plus the bookkeeping behind them.
#[derive(Clone, Debug, Default)]
pub struct RiverFormation {
    pub threshold: f32,
    pub rivers: Vec<TracedRiver>,
    /// Candidate sources considered (after the cap).
    pub candidates: usize,
    /// Sources skipped because an earlier river already claimed them.
    pub skipped_claimed: usize,
    pub rejected_short: usize,
    pub rejected_collision: usize,
    pub rejected_dead_end: usize,
}

impl RiverFormation {
    pub fn rejected(&self) -> usize {
        self.rejected_short + self.rejected_collision + self.rejected_dead_end
    }
}

/// Settled result of the retry loop.
#[derive(Clone, Debug)]
pub struct RiverTrace {
    pub formation: RiverFormation,
    pub attempts: usize,
    /// Threshold used by each attempt, in order.
    pub thresholds: Vec<f32>,
    /// Discharge-ranked candidates of the final attempt.
    pub sources: Vec<CellId>,
}

enum TraceEnd {
    Ocean,
    MapEdge,
    Claimed(usize),
    DeadEnd,
}

/// Land cells with discharge at or above `threshold`, highest first, capped.
pub fn candidate_sources(
    mesh: &Mesh,
    accumulation: &FlowAccumulation,
    threshold: f32,
    max_sources: usize,
) -> Vec<CellId> {
    let mut sources: Vec<CellId> = mesh
        .ids()
        .filter(|&id| mesh.is_land(id) && accumulation.get(id) as f32 >= threshold)
        .collect();
    sources.sort_by_key(|&id| (Reverse(accumulation.get(id)), id));
    sources.truncate(max_sources);
    sources
}

/// Walk downstream from `source`. `stamp`/`trace_no` mark cells on the current
/// path so a residual cycle ends the walk instead of looping.
fn trace_path(
    mesh: &Mesh,
    directions: &FlowDirections,
    claimed: &[Option<usize>],
    source: CellId,
    max_steps: usize,
    stamp: &mut [u32],
    trace_no: u32,
) -> (Vec<CellId>, TraceEnd) {
    let mut path = vec![source];
    stamp[source as usize] = trace_no;
    let mut current = source;

    for _ in 0..max_steps {
        let Some(next) = directions.get(current) else {
            let end = if mesh.is_border(current) {
                TraceEnd::MapEdge
            } else {
                TraceEnd::DeadEnd
            };
            return (path, end);
        };

        if mesh.is_ocean(next) {
            path.push(next);
            return (path, TraceEnd::Ocean);
        }
        if let Some(owner) = claimed[next as usize] {
            path.push(next);
            return (path, TraceEnd::Claimed(owner));
        }
        if stamp[next as usize] == trace_no {
            return (path, TraceEnd::DeadEnd);
        }

        stamp[next as usize] = trace_no;
        path.push(next);
        current = next;
    }

    (path, TraceEnd::DeadEnd)
}

/// Form rivers at a fixed threshold without mutating the mesh.
pub fn form_rivers(
    mesh: &Mesh,
    directions: &FlowDirections,
    accumulation: &FlowAccumulation,
    threshold: f32,
    config: &HydrologyConfig,
    cancel: &CancelToken,
) -> Result<(RiverFormation, Vec<CellId>), HydrologyError> {
    let sources = candidate_sources(mesh, accumulation, threshold, config.max_sources);
    let mut formation = RiverFormation {
        threshold,
        candidates: sources.len(),
        ..Default::default()
    };

    let mut claimed: Vec<Option<usize>> = vec![None; mesh.len()];
    let mut stamp = vec![0u32; mesh.len()];

    for (i, &source) in sources.iter().enumerate() {
        cancel.check(Stage::RiverTracing)?;
        if claimed[source as usize].is_some() {
            formation.skipped_claimed += 1;
            continue;
        }

        let trace_no = i as u32 + 1;
        let (cells, end) = trace_path(
            mesh,
            directions,
            &claimed,
            source,
            config.max_trace_steps,
            &mut stamp,
            trace_no,
        );

        let (outlet, parent) = match end {
            TraceEnd::Ocean => (Outlet::Ocean, None),
            TraceEnd::MapEdge => (Outlet::MapEdge, None),
            TraceEnd::Claimed(owner) => match config.confluence {
                ConfluencePolicy::Reject => {
                    formation.rejected_collision += 1;
                    continue;
                }
                ConfluencePolicy::Merge => (Outlet::Confluence, Some(owner)),
            },
            TraceEnd::DeadEnd => {
                formation.rejected_dead_end += 1;
                continue;
            }
        };

        if cells.len() < config.min_river_length {
            formation.rejected_short += 1;
            continue;
        }

        let index = formation.rivers.len();
        for &cell in &cells {
            let slot = &mut claimed[cell as usize];
            if slot.is_none() && mesh.is_land(cell) {
                *slot = Some(index);
            }
        }
        formation.rivers.push(TracedRiver {
            cells,
            outlet,
            parent,
        });
    }

    Ok((formation, sources))
}

/// Form rivers, relaxing the threshold until the target count is reached, the
/// floor is hit, or attempts run out.
pub fn trace_rivers(
    mesh: &Mesh,
    directions: &FlowDirections,
    accumulation: &FlowAccumulation,
    config: &HydrologyConfig,
    cancel: &CancelToken,
) -> Result<RiverTrace, HydrologyError> {
    let floor = config.min_threshold;
    let mut threshold = config.initial_threshold(mesh.len());
    let mut thresholds = Vec::new();

    loop {
        cancel.check(Stage::RiverTracing)?;
        let (formation, sources) =
            form_rivers(mesh, directions, accumulation, threshold, config, cancel)?;
        thresholds.push(threshold);
        let attempts = thresholds.len();

        debug!(
            attempt = attempts,
            threshold,
            candidates = formation.candidates,
            accepted = formation.rivers.len(),
            rejected = formation.rejected(),
            "river formation attempt"
        );

        let enough = formation.rivers.len() >= config.target_rivers;
        if !config.auto_adjust || enough || threshold <= floor || attempts >= config.max_attempts {
            return Ok(RiverTrace {
                formation,
                attempts,
                thresholds,
                sources,
            });
        }

        threshold = (threshold * config.relaxation_factor).max(floor);
    }
}

/// Assign ids and write the formation into the mesh.
pub fn apply_rivers(
    mesh: &mut Mesh,
    formation: &RiverFormation,
    accumulation: &FlowAccumulation,
) -> Vec<River> {
    let mut rivers = Vec::with_capacity(formation.rivers.len());

    for (index, traced) in formation.rivers.iter().enumerate() {
        let id = RiverId(index as u32 + 1);
        let own_len = match traced.outlet {
            Outlet::MapEdge => traced.cells.len(),
            Outlet::Ocean | Outlet::Confluence => traced.cells.len() - 1,
        };
        let own = &traced.cells[..own_len];

        for &cell in own {
            let c = mesh.cell_mut(cell);
            c.has_river = true;
            if c.river_id == 0 {
                c.river_id = id.0;
            }
        }

        let source = traced.cells[0];
        let mouth = own.last().copied().unwrap_or(source);
        let max_discharge = own.iter().map(|&c| accumulation.get(c)).max().unwrap_or(0);

        rivers.push(River {
            id,
            cells: traced.cells.clone(),
            source,
            mouth,
            outlet: traced.outlet,
            parent: traced.parent.map(|p| RiverId(p as u32 + 1)),
            width: 1.0,
            length: traced.cells.len(),
            kind: RiverType::Stream,
            is_seasonal: false,
            name: String::new(),
            max_discharge,
            mouth_discharge: accumulation.get(mouth),
        });
    }

    rivers
}
