//! Fluent builder for constructing `AgentArena` + `AgentRngs` in one step.
//!
//! # Usage
//!
//! ```rust
//! use tsim_agent::PopulationBuilder;
//! use tsim_core::GeoPoint;
//! use tsim_spatial::{EdgeAttrs, RoadGraphBuilder, ShortestPath};
//!
//! let mut b = RoadGraphBuilder::new();
//! let a = b.add_node(GeoPoint::new(0.0, 0.0));
//! let c = b.add_node(GeoPoint::new(0.0, 1.0));
//! b.add_road(a, c, EdgeAttrs::default());
//! let graph = b.build().unwrap();
//!
//! let (arena, rngs) = PopulationBuilder::new(42)
//!     .random(100)
//!     .speed_range(1.0, 2.0)
//!     .build(&graph, &ShortestPath::hops())
//!     .unwrap();
//!
//! assert_eq!(arena.len(), 100);
//! assert_eq!(rngs.len(), 100);
//! ```

use tsim_core::{AgentId, NodeId, SimConfig};
use tsim_spatial::{RoadGraph, Router};

use crate::{Agent, AgentArena, AgentError, AgentResult, AgentRngs};

/// An explicitly placed agent.
#[derive(Copy, Clone, Debug)]
struct Spawn {
    start:  NodeId,
    target: Option<NodeId>,
    speed:  Option<f32>,
}

/// Fluent builder for [`AgentArena`] + [`AgentRngs`].
///
/// Explicit spawns take the lowest ids in the order they were added; random
/// agents follow.
pub struct PopulationBuilder {
    seed:         u64,
    random_count: usize,
    speed_min:    f32,
    speed_max:    f32,
    spawns:       Vec<Spawn>,
}

impl PopulationBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            random_count: 0,
            speed_min: 1.0,
            speed_max: 2.0,
            spawns: Vec::new(),
        }
    }

    /// `config.agent_count` random agents with the configured speed range.
    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.seed)
            .random(config.agent_count)
            .speed_range(config.speed_min, config.speed_max)
    }

    /// Add `count` agents at uniformly random start nodes.
    pub fn random(mut self, count: usize) -> Self {
        self.random_count += count;
        self
    }

    /// Speeds are drawn from `[min, max)`; `min == max` gives a fixed speed.
    pub fn speed_range(mut self, min: f32, max: f32) -> Self {
        self.speed_min = min;
        self.speed_max = max;
        self
    }

    /// One agent at `start` that picks random targets.
    pub fn spawn(mut self, start: NodeId, speed: f32) -> Self {
        self.spawns.push(Spawn { start, target: None, speed: Some(speed) });
        self
    }

    /// One agent routed from `start` to `target` at build time.
    pub fn spawn_to(mut self, start: NodeId, target: NodeId, speed: f32) -> Self {
        self.spawns.push(Spawn { start, target: Some(target), speed: Some(speed) });
        self
    }

    pub fn count(&self) -> usize {
        self.spawns.len() + self.random_count
    }

    /// Place every agent on `graph`.  Agents with an explicit target are
    /// routed immediately; the rest plan on their first frame.
    pub fn build<R: Router + ?Sized>(
        &self,
        graph: &RoadGraph,
        router: &R,
    ) -> AgentResult<(AgentArena, AgentRngs)> {
        let count = self.count();
        if count > 0 && graph.is_empty() {
            return Err(AgentError::EmptyGraph);
        }
        let mut rngs = AgentRngs::new(count, self.seed);
        let mut agents = Vec::with_capacity(count);
        let nodes: Vec<NodeId> = graph.nodes().collect();

        let random = std::iter::repeat_n(None, self.random_count);
        let spawns = self.spawns.iter().copied().map(Some).chain(random);

        for (i, spawn) in spawns.enumerate() {
            let id = AgentId(i as u32);
            let rng = rngs.get_mut(id);

            let start = match spawn {
                Some(s) => s.start,
                None => match rng.choose(&nodes) {
                    Some(&n) => n,
                    None => return Err(AgentError::EmptyGraph),
                },
            };
            if !graph.contains_node(start) {
                return Err(AgentError::NodeNotFound(start));
            }
            let speed = match spawn.and_then(|s| s.speed) {
                Some(v) => v,
                None if self.speed_min < self.speed_max => {
                    rng.gen_range(self.speed_min..self.speed_max)
                }
                None => self.speed_min,
            };

            let mut agent = Agent::new(id, start, graph.position(start), speed);
            if let Some(target) = spawn.and_then(|s| s.target) {
                agent.plan_to(graph, router, target)?;
            }
            agents.push(agent);
        }

        Ok((AgentArena::new(agents), rngs))
    }
}
