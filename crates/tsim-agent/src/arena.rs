//! Agent storage: `AgentArena` (agent state) and `AgentRngs` (per-agent RNG).
//!
//! # Why two structs?
//!
//! Planning needs `&mut AgentRng` for one agent while the frame loop also
//! holds `&mut Agent` for the same slot and `&RoadGraph`/`&Router` shared.
//! Keeping RNGs out of the arena lets both be borrowed mutably at once:
//!
//! ```ignore
//! let agent = sim.agents.get_mut(id);
//! let rng   = sim.rngs.get_mut(id);
//! agent.plan_random(&sim.graph, &sim.router, rng, attempts)?;
//! ```

use tsim_core::{AgentId, AgentRng};

use crate::{Agent, AgentStatus};

// ── AgentRngs ─────────────────────────────────────────────────────────────────

/// Per-agent deterministic RNG state, indexed by `AgentId`.
pub struct AgentRngs {
    pub inner: Vec<AgentRng>,
}

impl AgentRngs {
    /// Seed `count` RNGs from `global_seed`.
    pub fn new(count: usize, global_seed: u64) -> Self {
        let inner = (0..count as u32)
            .map(|i| AgentRng::new(global_seed, AgentId(i)))
            .collect();
        Self { inner }
    }

    #[inline]
    pub fn get_mut(&mut self, agent: AgentId) -> &mut AgentRng {
        &mut self.inner[agent.index()]
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ── AgentArena ────────────────────────────────────────────────────────────────

/// Index-stable agent collection.
///
/// `agents[i].id == AgentId(i)` always holds.  Removing an agent clears its
/// liveness flag; the slot and its final state remain for the run summary.
#[derive(Clone, Debug, Default)]
pub struct AgentArena {
    agents: Vec<Agent>,
    alive:  Vec<bool>,
}

impl AgentArena {
    /// Take ownership of `agents`, re-stamping ids to match their slots.
    pub fn new(mut agents: Vec<Agent>) -> Self {
        for (i, agent) in agents.iter_mut().enumerate() {
            agent.id = AgentId(i as u32);
        }
        let alive = vec![true; agents.len()];
        Self { agents, alive }
    }

    /// Total slots, live or not.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    #[inline]
    pub fn get(&self, id: AgentId) -> &Agent {
        &self.agents[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: AgentId) -> &mut Agent {
        &mut self.agents[id.index()]
    }

    #[inline]
    pub fn is_alive(&self, id: AgentId) -> bool {
        self.alive[id.index()]
    }

    /// Take an agent out of the active population.
    pub fn retire(&mut self, id: AgentId) {
        self.alive[id.index()] = false;
    }

    /// Every slot in ascending id order, including retired agents.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.agents.iter()
    }

    /// Live agents in ascending id order.
    pub fn iter_alive(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.agents
            .iter()
            .zip(&self.alive)
            .filter(|(_, alive)| **alive)
            .map(|(a, _)| a)
    }

    /// Live agents that still take part in the frame loop.
    pub fn iter_active(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.iter_alive().filter(|a| !a.is_arrived())
    }

    pub fn as_slice(&self) -> &[Agent] {
        &self.agents
    }

    /// Agents with status `Arrived`, live or retired.
    pub fn arrived_count(&self) -> usize {
        self.agents.iter().filter(|a| a.status == AgentStatus::Arrived).count()
    }
}
