//! `compare` — signal placement comparison on a synthetic street grid.
//!
//! 1. Baseline run with signals only at the tagged arterial crossings.
//! 2. Density-ranked, degree-ranked and random placements, each re-run and
//!    compared against the baseline.
//! 3. A controlled re-run of the density placement: every signal is driven
//!    externally by a periodic-split controller on its own thread, and the
//!    frames are written to CSV under `./output`.
//!
//! Run with:
//!   cargo run -p compare --release [config.toml]
//!
//! `RUST_LOG=debug` shows per-run details.

mod network;

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tsim_control::{PeriodicSplitController, control_channel, spawn_controller};
use tsim_core::{SignalDriver, SimConfig};
use tsim_output::{CsvWriter, SimOutputObserver};
use tsim_placement::{
    Comparison, DegreeRanked, DensityRanked, PlacementExperiment, PlacementPolicy, RandomPlacement,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::from_toml_file(&path).with_context(|| format!("loading {path}"))?,
        None => SimConfig::default(),
    };

    println!("=== tsim  compare — signal placement on an 8x8 grid ===");
    println!(
        "Agents: {}  |  Frames: {}  |  Seed: {}  |  Arrival: {:?}",
        config.agent_count,
        config.total_frames(),
        config.seed,
        config.arrival_mode,
    );
    println!();

    let graph = network::build_grid(config.canvas_size)?;
    println!(
        "Road network: {} nodes, {} edges, {} tagged signals",
        graph.node_count(),
        graph.edge_count(),
        graph.signal_tagged_nodes().count(),
    );

    // ── Placement policies ────────────────────────────────────────────────
    let experiment = PlacementExperiment::from_config(config.clone(), graph.clone());
    let mut policies: Vec<Box<dyn PlacementPolicy>> = vec![
        Box::new(DensityRanked::default()),
        Box::new(DegreeRanked::default()),
        Box::new(RandomPlacement::new(20, config.seed)),
    ];

    let mut density_placement = Vec::new();
    let mut baseline = None;
    for policy in &mut policies {
        let t = Instant::now();
        let report = experiment.run(policy.as_mut())?;
        println!();
        println!("── {} ({:.2}s) ──", report.policy, t.elapsed().as_secs_f64());
        println!("Signals added:      {}", report.added);
        println!("{}", report.comparison);
        if report.policy == "density-ranked" {
            density_placement = report.placed.clone();
        }
        baseline.get_or_insert(report.baseline);
    }
    let Some(baseline) = baseline else {
        return Ok(());
    };

    println!();
    println!("── baseline ──");
    println!("{baseline}");

    // ── Controlled re-run ─────────────────────────────────────────────────
    let mut controlled_config = config.clone();
    controlled_config.signals.driver = SignalDriver::External;
    let controlled = PlacementExperiment::from_config(controlled_config, graph);

    let table = controlled.table_with(&density_placement)?;
    let keys: Vec<_> = table.keys().collect();
    let mut sim = controlled.build_sim(table)?;

    let (tx, rx) = control_channel();
    sim.set_control(rx);
    let controller = spawn_controller(PeriodicSplitController::default(), keys, tx)?;

    let out_dir = Path::new("output");
    let mut observer = SimOutputObserver::new(CsvWriter::new(out_dir)?);
    let t = Instant::now();
    let summary = sim.run(&mut observer)?;
    controller.stop();
    info!(rows = observer.rows_written(), dir = %out_dir.display(), "output written");

    println!();
    println!("── controlled density placement ({:.2}s) ──", t.elapsed().as_secs_f64());
    println!("{summary}");
    println!("{}", Comparison::between(&baseline, &summary));

    Ok(())
}
