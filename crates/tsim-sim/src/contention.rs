//! Frame-stable index of agents by the transition they are attempting.
//!
//! Built once per frame, before any agent moves, so every contention check
//! in that frame sees the same positions regardless of update order.

use tsim_core::{AgentId, NodeId, RenderPoint};

#[cfg(feature = "fx-hash")]
type TransitionMap<V> = rustc_hash::FxHashMap<(NodeId, NodeId), V>;
#[cfg(not(feature = "fx-hash"))]
type TransitionMap<V> = std::collections::HashMap<(NodeId, NodeId), V>;

/// One agent's pre-move state for this frame.
#[derive(Copy, Clone, Debug)]
pub struct Candidate {
    pub agent:    AgentId,
    pub current:  NodeId,
    pub next:     NodeId,
    pub position: RenderPoint,
    /// Render distance from `position` to the `next` node.
    pub remaining: f32,
}

impl Candidate {
    /// `true` if `other` goes ahead of `self` on a shared transition:
    /// strictly closer to the next node, or equally close with a lower id.
    #[inline]
    fn yields_to(&self, other: &Candidate) -> bool {
        other.remaining < self.remaining
            || (other.remaining == self.remaining && other.agent < self.agent)
    }
}

/// `(current, next)` → candidates on that transition.
#[derive(Debug, Default)]
pub struct TransitionIndex {
    map: TransitionMap<Vec<Candidate>>,
}

impl TransitionIndex {
    pub fn build(candidates: &[Candidate]) -> Self {
        let mut map: TransitionMap<Vec<Candidate>> = Default::default();
        for c in candidates {
            map.entry((c.current, c.next)).or_default().push(*c);
        }
        Self { map }
    }

    /// `true` if another agent on the same transition is within `threshold`
    /// of `me` and goes ahead of it.  The leader of a cluster is never
    /// blocked, so a queue always drains.
    pub fn is_blocked(&self, me: &Candidate, threshold: f32) -> bool {
        let Some(peers) = self.map.get(&(me.current, me.next)) else {
            return false;
        };
        peers.iter().any(|other| {
            other.agent != me.agent
                && me.position.distance(other.position) < threshold
                && me.yields_to(other)
        })
    }

    /// Number of distinct transitions in use.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
