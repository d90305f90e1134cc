//! Drainage network generation over an irregular mesh
//!
//! Runs the full hydrology pass as one batch:
//! 1. Priority-Flood pit filling so every cell can drain to the sea or map edge
//! 2. Coast markup (coast distance, haven, harbor)
//! 3. Steepest-descent flow routing with flat resolution
//! 4. Flow accumulation over a precomputed drainage order
//! 5. River tracing with threshold relaxation
//! 6. Lake identification on flat sinks
//! 7. Width/type classification, deltas, seasonality and naming
//!
//! Everything is single-threaded and deterministic for a given mesh, config and
//! seed. The seed only feeds river names.

pub mod accumulation;
pub mod classify;
pub mod coast;
pub mod delta;
pub mod lakes;
pub mod pit_fill;
pub mod rivers;
pub mod routing;

pub use accumulation::{accumulate_flow, DrainageOrder, FlowAccumulation};
pub use classify::{classify_seasonal, classify_widths, river_width};
pub use coast::{mark_coast, CoastSummary};
pub use delta::{generate_deltas, Delta};
pub use lakes::{identify_lakes, Lake};
pub use pit_fill::{fill_pits, PitFill};
pub use rivers::{
    apply_rivers, form_rivers, trace_rivers, Outlet, River, RiverFormation, RiverId, RiverTrace,
    RiverType,
};
pub use routing::{route_flow, FlowDirections, NO_FLOW};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::HydrologyConfig;
use crate::error::HydrologyError;
use crate::mesh::Mesh;
use crate::naming::RiverNamer;
use crate::report::HydrologyReport;

/// Pipeline stage, used to report where a run was cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    PitFill,
    Coast,
    FlowRouting,
    Accumulation,
    RiverTracing,
    Lakes,
    Classification,
    Seasonality,
    Deltas,
    Naming,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::PitFill => "pit filling",
            Stage::Coast => "coast markup",
            Stage::FlowRouting => "flow routing",
            Stage::Accumulation => "flow accumulation",
            Stage::RiverTracing => "river tracing",
            Stage::Lakes => "lake identification",
            Stage::Classification => "river classification",
            Stage::Seasonality => "seasonal classification",
            Stage::Deltas => "delta generation",
            Stage::Naming => "river naming",
        };
        write!(f, "{}", name)
    }
}

/// Cooperative cancellation flag shared between the caller and a run.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self, stage: Stage) -> Result<(), HydrologyError> {
        if self.is_cancelled() {
            Err(HydrologyError::Cancelled { stage })
        } else {
            Ok(())
        }
    }
}

/// Everything one run produces besides the in-place cell updates.
#[derive(Clone, Debug)]
pub struct Hydrology {
    pub pit_fill: PitFill,
    pub directions: FlowDirections,
    pub order: DrainageOrder,
    pub accumulation: FlowAccumulation,
    pub rivers: Vec<River>,
    pub lakes: Vec<Lake>,
    pub deltas: Vec<Delta>,
    pub coast: CoastSummary,
    pub report: HydrologyReport,
}

impl Hydrology {
    pub fn river(&self, id: RiverId) -> Option<&River> {
        self.rivers.iter().find(|r| r.id == id)
    }
}

/// Batch hydrology engine.
#[derive(Clone, Debug, Default)]
pub struct HydrologyEngine {
    config: HydrologyConfig,
    cancel: CancelToken,
}

impl HydrologyEngine {
    pub fn new(config: HydrologyConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Attach a cancellation token checked between stages and inside the
    /// longer loops.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &HydrologyConfig {
        &self.config
    }

    /// Run the whole pass over `mesh`, mutating heights (pit fill), river,
    /// flux, feature and coast fields in place.
    pub fn generate(&self, mesh: &mut Mesh, seed: u64) -> Result<Hydrology, HydrologyError> {
        let config = &self.config;
        let cancel = &self.cancel;
        config.validate()?;
        mesh.reset_outputs();

        cancel.check(Stage::PitFill)?;
        let pit_fill = fill_pits(mesh, config.significant_fill_depth, cancel)?;
        info!(
            cells = mesh.len(),
            raised = pit_fill.raised_count(),
            significant = pit_fill.significant_count(),
            "pit filling complete"
        );

        cancel.check(Stage::Coast)?;
        let coast = mark_coast(mesh);

        cancel.check(Stage::FlowRouting)?;
        let directions = route_flow(mesh);
        info!(
            flat_routed = directions.flat_routed(),
            unresolved = directions.unresolved_land(mesh),
            "flow routing complete"
        );

        cancel.check(Stage::Accumulation)?;
        let order = DrainageOrder::new(mesh, &directions);
        let accumulation = accumulate_flow(mesh, &directions, &order, config.precipitation_scale);
        info!(max_discharge = accumulation.max(), "flow accumulation complete");

        let trace = trace_rivers(mesh, &directions, &accumulation, config, cancel)?;
        let mut rivers = apply_rivers(mesh, &trace.formation, &accumulation);
        info!(
            rivers = rivers.len(),
            threshold = trace.formation.threshold,
            attempts = trace.attempts,
            "river tracing complete"
        );

        cancel.check(Stage::Lakes)?;
        let lakes = identify_lakes(mesh, &pit_fill, config.min_lake_size);

        cancel.check(Stage::Classification)?;
        classify_widths(&mut rivers);

        cancel.check(Stage::Deltas)?;
        let deltas = generate_deltas(mesh, &rivers, config);

        cancel.check(Stage::Seasonality)?;
        let seasonal = classify_seasonal(&mut rivers, mesh, config.seasonal_precipitation);

        cancel.check(Stage::Naming)?;
        let mut namer = RiverNamer::new(seed);
        for river in &mut rivers {
            river.name = namer.name_for(river);
        }
        info!(
            lakes = lakes.len(),
            deltas = deltas.len(),
            seasonal,
            "hydrology complete"
        );

        let report = HydrologyReport::build(
            mesh,
            &pit_fill,
            &directions,
            &accumulation,
            &trace,
            &rivers,
            &lakes,
            &deltas,
        );

        Ok(Hydrology {
            pit_fill,
            directions,
            order,
            accumulation,
            rivers,
            lakes,
            deltas,
            coast,
            report,
        })
    }
}
