//! Diagnostics report for one hydrology run.

use serde::Serialize;

use crate::hydrology::{
    Delta, FlowAccumulation, FlowDirections, Lake, Outlet, PitFill, River, RiverTrace, RiverType,
};
use crate::mesh::{CellId, Mesh};

/// Number of highest-discharge sources listed in the report.
const TOP_SOURCES: usize = 10;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DischargeQuantiles {
    pub p50: u32,
    pub p90: u32,
    pub p99: u32,
    pub max: u32,
}

impl DischargeQuantiles {
    /// Nearest-rank quantiles over `values`.
    pub fn from_values(mut values: Vec<u32>) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        values.sort_unstable();
        let n = values.len();
        let rank = |percent: usize| values[((percent * n).div_ceil(100)).clamp(1, n) - 1];
        Self {
            p50: rank(50),
            p90: rank(90),
            p99: rank(99),
            max: values[values.len() - 1],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceEntry {
    pub cell: CellId,
    pub discharge: u32,
    pub height: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiverSummary {
    pub id: u32,
    pub name: String,
    pub length: usize,
    pub width: f32,
    pub kind: RiverType,
    pub outlet: Outlet,
    pub parent: Option<u32>,
    pub seasonal: bool,
    pub source_height: u8,
    pub max_discharge: u32,
    pub mouth_discharge: u32,
}

/// Everything worth knowing about how a run went.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HydrologyReport {
    pub cells: usize,
    pub land_cells: usize,

    pub threshold: f32,
    pub thresholds_tried: Vec<f32>,
    pub attempts: usize,
    pub candidates: usize,
    pub accepted: usize,
    pub skipped_claimed: usize,
    pub rejected_short: usize,
    pub rejected_collision: usize,
    pub rejected_dead_end: usize,

    pub cells_raised: usize,
    pub significant_fills: usize,
    pub unreachable_cells: usize,
    pub flat_routed: usize,
    pub unresolved_sinks: usize,

    pub lakes: usize,
    pub deltas: usize,
    pub seasonal_rivers: usize,

    pub discharge: DischargeQuantiles,
    pub top_sources: Vec<SourceEntry>,
    pub rivers: Vec<RiverSummary>,
}

impl HydrologyReport {
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        mesh: &Mesh,
        pit_fill: &PitFill,
        directions: &FlowDirections,
        accumulation: &FlowAccumulation,
        trace: &RiverTrace,
        rivers: &[River],
        lakes: &[Lake],
        deltas: &[Delta],
    ) -> Self {
        let land: Vec<u32> = mesh
            .ids()
            .filter(|&id| mesh.is_land(id))
            .map(|id| accumulation.get(id))
            .collect();

        let top_sources = trace
            .sources
            .iter()
            .take(TOP_SOURCES)
            .map(|&cell| SourceEntry {
                cell,
                discharge: accumulation.get(cell),
                height: mesh.height(cell),
            })
            .collect();

        let summaries = rivers
            .iter()
            .map(|r| RiverSummary {
                id: r.id.0,
                name: r.name.clone(),
                length: r.length,
                width: r.width,
                kind: r.kind,
                outlet: r.outlet,
                parent: r.parent.map(|p| p.0),
                seasonal: r.is_seasonal,
                source_height: mesh.height(r.source),
                max_discharge: r.max_discharge,
                mouth_discharge: r.mouth_discharge,
            })
            .collect();

        let formation = &trace.formation;
        Self {
            cells: mesh.len(),
            land_cells: land.len(),
            threshold: formation.threshold,
            thresholds_tried: trace.thresholds.clone(),
            attempts: trace.attempts,
            candidates: formation.candidates,
            accepted: formation.rivers.len(),
            skipped_claimed: formation.skipped_claimed,
            rejected_short: formation.rejected_short,
            rejected_collision: formation.rejected_collision,
            rejected_dead_end: formation.rejected_dead_end,
            cells_raised: pit_fill.raised_count(),
            significant_fills: pit_fill.significant_count(),
            unreachable_cells: pit_fill.unreachable_count(),
            flat_routed: directions.flat_routed(),
            unresolved_sinks: directions.unresolved_land(mesh),
            lakes: lakes.len(),
            deltas: deltas.len(),
            seasonal_rivers: rivers.iter().filter(|r| r.is_seasonal).count(),
            discharge: DischargeQuantiles::from_values(land),
            top_sources,
            rivers: summaries,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary on stdout.
    pub fn print_summary(&self) {
        println!("Hydrology: {} cells ({} land)", self.cells, self.land_cells);
        println!(
            "  Threshold: {:.1} after {} attempt(s) {:?}",
            self.threshold, self.attempts, self.thresholds_tried
        );
        println!(
            "  Candidates: {}  accepted: {}  claimed: {}  short: {}  collision: {}  dead end: {}",
            self.candidates,
            self.accepted,
            self.skipped_claimed,
            self.rejected_short,
            self.rejected_collision,
            self.rejected_dead_end
        );
        println!(
            "  Pit fill: {} raised, {} significant, {} unreachable",
            self.cells_raised, self.significant_fills, self.unreachable_cells
        );
        println!(
            "  Routing: {} flat cells routed, {} unresolved sinks",
            self.flat_routed, self.unresolved_sinks
        );
        println!(
            "  Discharge: p50 {}  p90 {}  p99 {}  max {}",
            self.discharge.p50, self.discharge.p90, self.discharge.p99, self.discharge.max
        );
        println!(
            "  Lakes: {}  Deltas: {}  Seasonal rivers: {}",
            self.lakes, self.deltas, self.seasonal_rivers
        );
        for r in &self.rivers {
            println!(
                "    #{:<3} {:<28} {:>4} cells  width {:>5.1}  {:<11}  {:?}{}",
                r.id,
                r.name,
                r.length,
                r.width,
                r.kind.display_name(),
                r.outlet,
                r.parent.map(|p| format!(" -> #{}", p)).unwrap_or_default()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantiles_nearest_rank() {
        let q = DischargeQuantiles::from_values((1..=100).collect());
        assert_eq!(q.p50, 50);
        assert_eq!(q.p90, 90);
        assert_eq!(q.p99, 99);
        assert_eq!(q.max, 100);
    }

    #[test]
    fn test_quantiles_small_and_empty() {
        assert_eq!(DischargeQuantiles::from_values(Vec::new()), DischargeQuantiles::default());
        let q = DischargeQuantiles::from_values(vec![7]);
        assert_eq!((q.p50, q.p90, q.p99, q.max), (7, 7, 7, 7));
    }
}
