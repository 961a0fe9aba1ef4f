//! Baseline → place → re-run experiments and their comparison.

use std::fmt;

use tracing::info;

use tsim_core::{NodeId, SimConfig};
use tsim_signal::SignalTable;
use tsim_sim::{FrameObserver, NoopObserver, RunSummary, Sim, SimBuilder};
use tsim_spatial::{RoadGraph, Router, ShortestPath};

use crate::{PlacementContext, PlacementPolicy, PlacementResult, apply_placement};

// ── Comparison ────────────────────────────────────────────────────────────────

/// Aggregate congestion of a treated run relative to its baseline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Comparison {
    pub baseline_density:     u64,
    pub treated_density:      u64,
    /// `(baseline - treated) / baseline * 100`; 0 when the baseline is 0.
    pub improvement_pct:      f64,
    pub baseline_arrived_pct: f64,
    pub treated_arrived_pct:  f64,
}

impl Comparison {
    pub fn between(baseline: &RunSummary, treated: &RunSummary) -> Self {
        Self {
            baseline_density:     baseline.total_density,
            treated_density:      treated.total_density,
            improvement_pct:      improvement_pct(baseline.total_density, treated.total_density),
            baseline_arrived_pct: baseline.arrived_pct(),
            treated_arrived_pct:  treated.arrived_pct(),
        }
    }

    pub fn is_improvement(&self) -> bool {
        self.treated_density < self.baseline_density
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Baseline density:   {}", self.baseline_density)?;
        writeln!(f, "Treated density:    {}", self.treated_density)?;
        write!(f, "Improvement:        {:.2}%", self.improvement_pct)
    }
}

/// Percentage reduction from `baseline` to `treated`.  Negative when the
/// treated run is more congested.
pub fn improvement_pct(baseline: u64, treated: u64) -> f64 {
    if baseline == 0 {
        return 0.0;
    }
    (baseline as f64 - treated as f64) / baseline as f64 * 100.0
}

// ── PlacementExperiment ───────────────────────────────────────────────────────

/// Outcome of one [`PlacementExperiment::run`].
#[derive(Clone, Debug)]
pub struct ExperimentReport {
    pub policy:     String,
    /// Nodes the policy selected, in the order it returned them.
    pub placed:     Vec<NodeId>,
    /// Signals actually added (lane scope adds one per outgoing edge).
    pub added:      usize,
    pub baseline:   RunSummary,
    pub treated:    RunSummary,
    pub comparison: Comparison,
}

/// Runs the same configuration twice, once with the graph's tagged signals
/// and once with a policy's placement added on top.
///
/// Both runs share the seed, so they start from the same population.
#[derive(Clone, Debug)]
pub struct PlacementExperiment<R: Router + Clone> {
    pub config: SimConfig,
    pub graph:  RoadGraph,
    pub router: R,
}

impl PlacementExperiment<ShortestPath> {
    /// Hop or weighted shortest paths per `config.weighted_paths`.
    pub fn from_config(config: SimConfig, graph: RoadGraph) -> Self {
        let router = if config.weighted_paths {
            ShortestPath::weighted()
        } else {
            ShortestPath::hops()
        };
        Self::new(config, graph, router)
    }
}

impl<R: Router + Clone> PlacementExperiment<R> {
    pub fn new(config: SimConfig, graph: RoadGraph, router: R) -> Self {
        Self { config, graph, router }
    }

    /// The signal table a run starts from: one signal per tagged node.
    pub fn baseline_table(&self) -> PlacementResult<SignalTable> {
        Ok(SignalTable::from_tagged_nodes(&self.graph, &self.config.signals)?)
    }

    /// The baseline table plus signals at `nodes`.
    pub fn table_with(&self, nodes: &[NodeId]) -> PlacementResult<SignalTable> {
        let mut table = self.baseline_table()?;
        apply_placement(&mut table, &self.graph, nodes)?;
        Ok(table)
    }

    /// A fresh simulation using `table`.
    pub fn build_sim(&self, table: SignalTable) -> PlacementResult<Sim<R>> {
        Ok(SimBuilder::new(self.config.clone(), self.graph.clone(), self.router.clone())
            .signals(table)
            .build()?)
    }

    pub fn run_with<O: FrameObserver>(&self, table: SignalTable, observer: &mut O) -> PlacementResult<RunSummary> {
        let mut sim = self.build_sim(table)?;
        Ok(sim.run(observer)?)
    }

    /// Baseline run, placement, treated run, comparison.
    pub fn run<P: PlacementPolicy + ?Sized>(&self, policy: &mut P) -> PlacementResult<ExperimentReport> {
        let baseline_table = self.baseline_table()?;
        let baseline = self.run_with(baseline_table.clone(), &mut NoopObserver)?;

        let placed = policy.select(&PlacementContext {
            graph:    &self.graph,
            baseline: &baseline,
            existing: &baseline_table,
        });
        let mut table = baseline_table;
        let added = apply_placement(&mut table, &self.graph, &placed)?;
        info!(policy = policy.name(), selected = placed.len(), added, signals = table.len(), "signals placed");

        let treated = self.run_with(table, &mut NoopObserver)?;
        let comparison = Comparison::between(&baseline, &treated);
        info!(
            policy = policy.name(),
            baseline = comparison.baseline_density,
            treated = comparison.treated_density,
            improvement_pct = comparison.improvement_pct,
            "placement evaluated"
        );

        Ok(ExperimentReport {
            policy: policy.name().to_owned(),
            placed,
            added,
            baseline,
            treated,
            comparison,
        })
    }
}
