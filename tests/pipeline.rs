use std::collections::HashSet;

use mesh_hydrology::hydrology::{Outlet, NO_FLOW};
use mesh_hydrology::synthetic::{hex_lattice, noisy_island, radial_island};
use mesh_hydrology::{
    CancelToken, ConfluencePolicy, HydrologyConfig, HydrologyEngine, HydrologyError,
    HydrologyPreset, Mesh, Stage,
};

fn run(mesh: &mut Mesh, config: HydrologyConfig, seed: u64) -> mesh_hydrology::Hydrology {
    HydrologyEngine::new(config).generate(mesh, seed).unwrap()
}

#[test]
fn test_pipeline_invariants_on_noisy_island() {
    let mut mesh = noisy_island(72, 54, 12).unwrap();
    let config = HydrologyConfig::default();
    let hydrology = run(&mut mesh, config.clone(), 12);

    // Flow directions point at neighbors, never at self
    for id in mesh.ids() {
        let down = hydrology.directions.as_slice()[id as usize];
        if down != NO_FLOW {
            assert_ne!(down, id);
            assert!(mesh.neighbors(id).contains(&down));
        }
        assert!(hydrology.accumulation.get(id) >= hydrology.accumulation.base(id));
        assert_eq!(mesh.cell(id).flux, hydrology.accumulation.get(id));
    }

    assert!(hydrology.report.attempts <= 5);
    assert!(hydrology.report.threshold >= config.min_threshold);

    let mut owned = HashSet::new();
    for river in &hydrology.rivers {
        assert!(river.cells.len() >= config.min_river_length);
        assert_eq!(river.length, river.cells.len());
        assert!(!river.name.is_empty());
        let unique: HashSet<_> = river.cells.iter().collect();
        assert_eq!(unique.len(), river.cells.len());

        let (last, body) = river.cells.split_last().unwrap();
        assert!(body.iter().all(|&c| mesh.is_land(c)));
        match river.outlet {
            Outlet::Ocean => assert!(mesh.is_ocean(*last)),
            Outlet::MapEdge => assert!(mesh.is_border(*last) && mesh.is_land(*last)),
            Outlet::Confluence => panic!("reject policy produced a tributary"),
        }
        for &c in body {
            assert!(owned.insert(c), "cell {} claimed by two rivers", c);
            assert_eq!(mesh.cell(c).river_id, river.id.0);
            assert!(mesh.cell(c).has_river);
        }
        if river.is_seasonal {
            assert!(river.name.ends_with("Wash"));
        }
    }

    for lake in &hydrology.lakes {
        assert!(lake.size() >= config.min_lake_size);
        assert!(lake.id.is_lake());
        for &c in &lake.cells {
            assert_eq!(mesh.cell(c).feature, lake.id);
            assert_eq!(mesh.height(c), lake.elevation);
        }
    }
    for id in mesh.ids().filter(|&id| mesh.is_ocean(id)) {
        assert!(mesh.cell(id).feature.is_ocean());
    }
    assert_eq!(hydrology.report.accepted, hydrology.rivers.len());
    assert_eq!(hydrology.report.lakes, hydrology.lakes.len());
}

#[test]
fn test_same_seed_same_output() {
    let mut a = noisy_island(60, 40, 77).unwrap();
    let mut b = noisy_island(60, 40, 77).unwrap();
    let ha = run(&mut a, HydrologyConfig::default(), 77);
    let hb = run(&mut b, HydrologyConfig::default(), 77);

    assert_eq!(ha.report, hb.report);
    assert_eq!(ha.rivers.len(), hb.rivers.len());
    for (ra, rb) in ha.rivers.iter().zip(&hb.rivers) {
        assert_eq!(ra.cells, rb.cells);
        assert_eq!(ra.name, rb.name);
    }
    assert_eq!(ha.lakes, hb.lakes);
    assert_eq!(ha.deltas, hb.deltas);
    let heights = |m: &Mesh| m.cells().iter().map(|c| (c.height, c.river_id, c.flux)).collect::<Vec<_>>();
    assert_eq!(heights(&a), heights(&b));
}

#[test]
fn test_rerun_on_same_mesh_is_stable() {
    let mut mesh = noisy_island(48, 36, 3).unwrap();
    let engine = HydrologyEngine::new(HydrologyConfig::default());
    let first = engine.generate(&mut mesh, 3).unwrap();
    let second = engine.generate(&mut mesh, 3).unwrap();
    // Heights are already filled the second time
    assert_eq!(second.report.cells_raised, 0);
    assert_eq!(first.rivers.len(), second.rivers.len());
}

#[test]
fn test_cancelled_before_run() {
    let mut mesh = radial_island(21, 25).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let engine = HydrologyEngine::new(HydrologyConfig::default()).with_cancel(cancel);
    let err = engine.generate(&mut mesh, 1).unwrap_err();
    assert_eq!(err, HydrologyError::Cancelled { stage: Stage::PitFill });
}

#[test]
fn test_invalid_config_rejected() {
    let mut mesh = radial_island(11, 11).unwrap();
    let config = HydrologyConfig { relaxation_factor: 0.0, ..Default::default() };
    let err = HydrologyEngine::new(config).generate(&mut mesh, 1).unwrap_err();
    assert!(matches!(err, HydrologyError::Config(_)));
}

#[test]
fn test_all_ocean_mesh_is_empty() {
    let mut mesh = hex_lattice(10, 10, |_, _, _| (5, 1.0)).unwrap();
    let hydrology = run(&mut mesh, HydrologyConfig::default(), 0);
    assert!(hydrology.rivers.is_empty());
    assert!(hydrology.lakes.is_empty());
    assert!(hydrology.deltas.is_empty());
    assert_eq!(hydrology.report.land_cells, 0);
    assert_eq!(hydrology.report.discharge.max, 0);
}

#[test]
fn test_merge_policy_tributaries_join_parents() {
    let mut mesh = noisy_island(72, 54, 12).unwrap();
    let config = HydrologyConfig {
        confluence: ConfluencePolicy::Merge,
        ..HydrologyConfig::from_preset(HydrologyPreset::Dense)
    };
    let hydrology = run(&mut mesh, config, 12);
    for river in hydrology.rivers.iter().filter(|r| r.outlet == Outlet::Confluence) {
        let parent = river.parent.expect("tributary without parent");
        assert!(parent < river.id);
        let parent = hydrology.river(parent).unwrap();
        let joint = *river.cells.last().unwrap();
        assert!(mesh.is_land(joint));
        assert!(parent.cells.contains(&joint));
        // The confluence cell stays with the parent
        assert_eq!(mesh.cell(joint).river_id, parent.id.0);
    }
}

#[test]
fn test_report_serializes() {
    let mut mesh = radial_island(31, 35).unwrap();
    let hydrology = run(&mut mesh, HydrologyConfig::default(), 9);
    let json = hydrology.report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    for key in ["threshold", "attempts", "rejected_collision", "significant_fills", "discharge", "rivers"] {
        assert!(value.get(key).is_some(), "report missing {}", key);
    }
}
