//! The `PlacementPolicy` trait and the built-in heuristics.

use std::collections::BTreeSet;

use tracing::debug;

use tsim_core::{NodeId, SimRng};
use tsim_signal::{SignalResult, SignalTable};
use tsim_sim::RunSummary;
use tsim_spatial::RoadGraph;

/// Read-only inputs available to a placement decision.
pub struct PlacementContext<'a> {
    pub graph:    &'a RoadGraph,
    /// Summary of the run the placement reacts to.
    pub baseline: &'a RunSummary,
    /// Signals that already exist and will be kept.
    pub existing: &'a SignalTable,
}

/// Chooses nodes that should receive new signals between two runs.
///
/// Placement never runs inside the frame loop: it sees the finished baseline
/// run and returns node ids; [`apply_placement`] turns them into signals for
/// the next run.
///
/// # Example
///
/// ```rust,ignore
/// struct Everywhere;
///
/// impl PlacementPolicy for Everywhere {
///     fn select(&mut self, ctx: &PlacementContext<'_>) -> Vec<NodeId> {
///         ctx.graph.nodes().collect()
///     }
/// }
/// ```
pub trait PlacementPolicy {
    fn select(&mut self, ctx: &PlacementContext<'_>) -> Vec<NodeId>;

    /// Short label used in logs and reports.
    fn name(&self) -> &str {
        "placement"
    }
}

/// Add signals at `nodes` to `table`.  Returns how many signals were added;
/// nodes that already carry one are skipped.
pub fn apply_placement(table: &mut SignalTable, graph: &RoadGraph, nodes: &[NodeId]) -> SignalResult<usize> {
    let mut added = 0;
    for &node in nodes {
        added += table.insert_node(graph, node)?;
    }
    debug!(requested = nodes.len(), added, total = table.len(), "placement applied");
    Ok(added)
}

// ── DensityRanked ─────────────────────────────────────────────────────────────

/// Endpoints of the `top_k` most congested edges of the baseline run.
///
/// Edges with a zero count are never selected.  Endpoints are returned in
/// rank order without duplicates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DensityRanked {
    pub top_k: usize,
}

impl DensityRanked {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }
}

impl Default for DensityRanked {
    fn default() -> Self {
        Self { top_k: 15 }
    }
}

impl PlacementPolicy for DensityRanked {
    fn select(&mut self, ctx: &PlacementContext<'_>) -> Vec<NodeId> {
        let mut seen = BTreeSet::new();
        let mut nodes = Vec::new();
        for (edge, _) in ctx
            .baseline
            .ranked_edges()
            .into_iter()
            .filter(|&(_, count)| count > 0)
            .take(self.top_k)
        {
            let (from, to) = ctx.graph.endpoints(edge);
            for n in [from, to] {
                if seen.insert(n) {
                    nodes.push(n);
                }
            }
        }
        nodes
    }

    fn name(&self) -> &str {
        "density-ranked"
    }
}

// ── DegreeRanked ──────────────────────────────────────────────────────────────

/// The `count` highest-degree nodes that are not signalled yet.
/// Ties go to the lower node id.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DegreeRanked {
    pub count: usize,
}

impl DegreeRanked {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl Default for DegreeRanked {
    fn default() -> Self {
        Self { count: 10 }
    }
}

impl PlacementPolicy for DegreeRanked {
    fn select(&mut self, ctx: &PlacementContext<'_>) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = ctx
            .graph
            .nodes()
            .filter(|&n| !ctx.existing.contains_node(n))
            .collect();
        nodes.sort_by(|&a, &b| ctx.graph.degree(b).cmp(&ctx.graph.degree(a)).then(a.cmp(&b)));
        nodes.truncate(self.count);
        nodes
    }

    fn name(&self) -> &str {
        "degree-ranked"
    }
}

// ── RandomPlacement ───────────────────────────────────────────────────────────

/// `count` random unsignalled nodes with degree at least `min_degree`.
pub struct RandomPlacement {
    pub count:      usize,
    pub min_degree: usize,
    rng:            SimRng,
}

impl RandomPlacement {
    pub fn new(count: usize, seed: u64) -> Self {
        Self { count, min_degree: 4, rng: SimRng::new(seed) }
    }

    pub fn min_degree(mut self, min_degree: usize) -> Self {
        self.min_degree = min_degree;
        self
    }
}

impl PlacementPolicy for RandomPlacement {
    fn select(&mut self, ctx: &PlacementContext<'_>) -> Vec<NodeId> {
        let candidates: Vec<NodeId> = ctx
            .graph
            .nodes()
            .filter(|&n| ctx.graph.degree(n) >= self.min_degree && !ctx.existing.contains_node(n))
            .collect();
        let mut picked = self.rng.sample(&candidates, self.count);
        picked.sort_unstable();
        picked
    }

    fn name(&self) -> &str {
        "random"
    }
}
