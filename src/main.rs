use std::error::Error;
use std::fs;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mesh_hydrology::config::{ConfluencePolicy, HydrologyConfig, HydrologyPreset};
use mesh_hydrology::export;
use mesh_hydrology::hydrology::HydrologyEngine;
use mesh_hydrology::synthetic;

#[derive(Parser, Debug)]
#[command(name = "mesh_hydrology")]
#[command(about = "Generate rivers, lakes and deltas on a synthetic island mesh")]
struct Args {
    /// Lattice width in cells
    #[arg(short = 'W', long, default_value = "96")]
    width: usize,

    /// Lattice height in cells
    #[arg(short = 'H', long, default_value = "72")]
    height: usize,

    /// Random seed for terrain and river names (random if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// River density preset (sparse, normal, dense)
    #[arg(short, long, default_value = "normal")]
    preset: HydrologyPreset,

    /// Load parameters from a JSON file (overrides the preset)
    #[arg(long)]
    config: Option<String>,

    /// Override the river formation threshold on a 10k-cell mesh
    #[arg(long)]
    min_flux: Option<f32>,

    /// Override the river count the threshold relaxation aims for
    #[arg(long)]
    target_rivers: Option<usize>,

    /// Keep traces that run into an existing river as tributaries
    #[arg(long)]
    merge: bool,

    /// Use the cone island instead of the noisy island
    #[arg(long)]
    radial: bool,

    /// Write the diagnostics report as JSON
    #[arg(long)]
    report: Option<String>,

    /// Write rivers, lakes and deltas as JSON
    #[arg(long)]
    features: Option<String>,

    /// Render the result to a PNG
    #[arg(long)]
    png: Option<String>,

    /// Pixels per cell in the PNG
    #[arg(long, default_value = "6")]
    scale: u32,
}

fn load_config(args: &Args) -> Result<HydrologyConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => HydrologyConfig::from_preset(args.preset),
    };
    if let Some(min_flux) = args.min_flux {
        config.min_flux = min_flux;
    }
    if let Some(target) = args.target_rivers {
        config.target_rivers = target;
    }
    if args.merge {
        config.confluence = ConfluencePolicy::Merge;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let seed = args.seed.unwrap_or_else(rand::random);

    println!("Generating hydrology with seed: {}", seed);
    println!("Mesh size: {}x{} ({} cells)", args.width, args.height, args.width * args.height);
    if args.config.is_none() {
        println!("Preset: {} ({})", args.preset, args.preset.description());
    }

    let mut mesh = if args.radial {
        synthetic::radial_island(args.width, args.height)?
    } else {
        synthetic::noisy_island(args.width, args.height, seed)?
    };
    println!("Land: {} of {} cells", mesh.land_count(), mesh.len());

    let engine = HydrologyEngine::new(config);
    let hydrology = engine.generate(&mut mesh, seed)?;
    hydrology.report.print_summary();

    if let Some(path) = &args.report {
        export::export_report_json(&hydrology, path)?;
    }
    if let Some(path) = &args.features {
        export::export_features_json(&hydrology, path)?;
    }
    if let Some(path) = &args.png {
        export::export_mesh_png(&mesh, &hydrology, path, args.scale)?;
    }

    Ok(())
}
