//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! Agents plan through the [`Router`] trait, so a run can swap in another
//! search (A*, congestion-aware costs) without touching the frame loop.
//!
//! # Cost units
//!
//! Costs are integer.  Hop-count search charges 1 per edge; weighted search
//! charges `round(weight * 1000)` with missing weights treated as 1.  Integer
//! costs keep tie-breaking exact and deterministic.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tsim_core::{EdgeId, NodeId};

use crate::network::RoadGraph;
use crate::{SpatialError, SpatialResult};

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable path search.
///
/// Implementations must be `Send + Sync` so they can be shared with the
/// parallel decide phase.
pub trait Router: Send + Sync {
    /// Node sequence from `from` to `to`, both endpoints included.
    ///
    /// `from == to` yields `[from]`.  Every consecutive pair in the result is
    /// an edge of `graph`.
    fn shortest_path(&self, graph: &RoadGraph, from: NodeId, to: NodeId) -> SpatialResult<Vec<NodeId>>;
}

// ── ShortestPath ──────────────────────────────────────────────────────────────

/// Dijkstra over the CSR graph, by hop count or by edge weight.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ShortestPath {
    pub weighted: bool,
}

impl ShortestPath {
    pub fn hops() -> Self {
        Self { weighted: false }
    }

    pub fn weighted() -> Self {
        Self { weighted: true }
    }

    #[inline]
    fn edge_cost(&self, graph: &RoadGraph, edge: EdgeId) -> u64 {
        if self.weighted {
            let w = graph.edge_weight[edge.index()].unwrap_or(1.0).max(0.0);
            (w as f64 * 1000.0).round() as u64
        } else {
            1
        }
    }
}

impl Router for ShortestPath {
    fn shortest_path(&self, graph: &RoadGraph, from: NodeId, to: NodeId) -> SpatialResult<Vec<NodeId>> {
        for node in [from, to] {
            if !graph.contains_node(node) {
                return Err(SpatialError::NodeNotFound(node));
            }
        }
        if from == to {
            return Ok(vec![from]);
        }

        let n = graph.node_count();
        let mut dist      = vec![u64::MAX; n];
        // prev_edge[v] = edge that reached v; INVALID for unreached nodes.
        let mut prev_edge = vec![EdgeId::INVALID; n];
        dist[from.index()] = 0;

        // Secondary key NodeId makes equal-cost expansion order deterministic.
        let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
        heap.push(Reverse((0, from)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if node == to {
                return Ok(reconstruct(graph, &prev_edge, from, to));
            }
            // Stale entry.
            if cost > dist[node.index()] {
                continue;
            }
            for edge in graph.out_edges(node) {
                let next = graph.edge_to[edge.index()];
                let new_cost = cost.saturating_add(self.edge_cost(graph, edge));
                if new_cost < dist[next.index()] {
                    dist[next.index()] = new_cost;
                    prev_edge[next.index()] = edge;
                    heap.push(Reverse((new_cost, next)));
                }
            }
        }

        Err(SpatialError::NoPathFound { from, to })
    }
}

fn reconstruct(graph: &RoadGraph, prev_edge: &[EdgeId], from: NodeId, to: NodeId) -> Vec<NodeId> {
    let mut path = vec![to];
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        cur = graph.edge_from[e.index()];
        path.push(cur);
    }
    path.reverse();
    path
}
