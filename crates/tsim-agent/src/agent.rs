//! A single vehicle and its movement automaton.
//!
//! # States
//!
//! ```text
//!            blocked (signal / contention)
//!   Traveling ───────────────────────────▶ Waiting
//!       ▲  ╲                                  │
//!       │   ╲ reached target                  │ moved
//!       │    ▼                                │
//!       │   Arrived (terminal)                │
//!       └─────────────────────────────────────┘
//! ```
//!
//! The frame loop decides whether an agent may move; this module only
//! carries out the outcome (plan, wait, or advance).

use std::collections::VecDeque;

use tracing::debug;

use tsim_core::{AgentId, AgentRng, NodeId, RenderPoint};
use tsim_spatial::{RoadGraph, Router, SpatialError};

use crate::{AgentError, AgentResult};

// ── AgentStatus ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum AgentStatus {
    #[default]
    Traveling,
    /// Blocked this frame by a signal or by another agent.
    Waiting,
    /// Reached its target.  No further updates.
    Arrived,
}

impl AgentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Traveling => "traveling",
            AgentStatus::Waiting   => "waiting",
            AgentStatus::Arrived   => "arrived",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one [`Agent::advance`] call did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Movement {
    /// Still on the edge.
    Moved,
    /// Snapped onto the next node, which is not the target.
    ReachedNode(NodeId),
    /// Snapped onto the target.
    ReachedTarget(NodeId),
}

// ── Agent ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Agent {
    pub id:       AgentId,
    pub current:  NodeId,
    /// `NodeId::INVALID` until the first plan.
    pub target:   NodeId,
    /// Remaining route.  While non-empty the head equals `current`.
    pub path:     VecDeque<NodeId>,
    pub position: RenderPoint,
    /// Render units per frame.
    pub speed:    f32,
    pub status:   AgentStatus,
    /// Frames blocked since the last node reached.
    pub stall_frames:    u32,
    pub trips_completed: u32,
}

impl Agent {
    pub fn new(id: AgentId, start: NodeId, position: RenderPoint, speed: f32) -> Self {
        Self {
            id,
            current: start,
            target: NodeId::INVALID,
            path: VecDeque::new(),
            position,
            speed,
            status: AgentStatus::Traveling,
            stall_frames: 0,
            trips_completed: 0,
        }
    }

    #[inline]
    pub fn is_arrived(&self) -> bool {
        self.status == AgentStatus::Arrived
    }

    /// Second element of the path, when the path is well formed.
    #[inline]
    pub fn next_hop(&self) -> Option<NodeId> {
        if self.path.front() == Some(&self.current) {
            self.path.get(1).copied()
        } else {
            None
        }
    }

    /// `true` for a non-arrived agent with nowhere to go next.
    #[inline]
    pub fn needs_plan(&self) -> bool {
        !self.is_arrived() && self.next_hop().is_none()
    }

    /// Replace the route.  `path` must start at `current`.
    pub fn set_path(&mut self, target: NodeId, path: Vec<NodeId>) {
        debug_assert_eq!(path.first(), Some(&self.current));
        self.target = target;
        self.path = path.into();
    }

    /// Drop the route; the agent re-plans on its next frame.
    pub fn discard_path(&mut self) {
        self.path.clear();
    }

    // ── Planning ──────────────────────────────────────────────────────────

    /// Route to a specific `target`.
    pub fn plan_to<R: Router + ?Sized>(
        &mut self,
        graph: &RoadGraph,
        router: &R,
        target: NodeId,
    ) -> AgentResult<()> {
        let path = router.shortest_path(graph, self.current, target)?;
        self.set_path(target, path);
        Ok(())
    }

    /// Route to a uniformly random node other than `current`, resampling on
    /// unreachable targets up to `max_attempts` times.
    pub fn plan_random<R: Router + ?Sized>(
        &mut self,
        graph: &RoadGraph,
        router: &R,
        rng: &mut AgentRng,
        max_attempts: u32,
    ) -> AgentResult<()> {
        let n = graph.node_count();
        if n < 2 {
            return Err(AgentError::PlanningFailed { agent: self.id, attempts: 0 });
        }
        for attempt in 1..=max_attempts {
            // Uniform over all nodes except `current`.
            let mut pick = rng.gen_range(0..n - 1);
            if pick >= self.current.index() {
                pick += 1;
            }
            let target = NodeId(pick as u32);
            match router.shortest_path(graph, self.current, target) {
                Ok(path) => {
                    self.set_path(target, path);
                    return Ok(());
                }
                Err(SpatialError::NoPathFound { .. }) => {
                    debug!(agent = %self.id, from = %self.current, to = %target, attempt, "target unreachable");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(AgentError::PlanningFailed { agent: self.id, attempts: max_attempts })
    }

    // ── Movement ──────────────────────────────────────────────────────────

    /// Record a blocked frame.
    pub fn block(&mut self) {
        self.status = AgentStatus::Waiting;
        self.stall_frames += 1;
    }

    /// Move toward `next` (rendered at `next_pos`) by `speed`.  Snaps onto
    /// the node when it is no farther than `speed` away.
    pub fn advance(&mut self, next: NodeId, next_pos: RenderPoint) -> Movement {
        self.status = AgentStatus::Traveling;
        if self.position.distance(next_pos) > self.speed {
            self.position = self.position.step_towards(next_pos, self.speed);
            return Movement::Moved;
        }

        self.position = next_pos;
        self.current = next;
        self.path.pop_front();
        self.stall_frames = 0;
        if next == self.target {
            self.status = AgentStatus::Arrived;
            self.trips_completed += 1;
            Movement::ReachedTarget(next)
        } else {
            Movement::ReachedNode(next)
        }
    }

    /// Leave `Arrived` so the agent can take another trip.
    pub fn restart(&mut self) {
        self.status = AgentStatus::Traveling;
        self.path.clear();
    }
}
