//! The set of signals active in one run.
//!
//! Keys are ordered (`BTreeMap`) so iteration, observer output and
//! controller snapshots are deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::AddAssign;

use tracing::{debug, trace};

use tsim_core::{NodeId, SignalConfig, SignalDriver, SignalScope};
use tsim_spatial::RoadGraph;

use crate::{ControlMessage, SignalError, SignalKey, SignalResult, SignalState, SignalTiming, TrafficSignal};

// ── ApplyStats ────────────────────────────────────────────────────────────────

/// Outcome of applying control messages.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Assignments that matched a signal in the table.
    pub applied: usize,
    /// Assignments naming keys the table does not contain.
    pub ignored: usize,
}

impl AddAssign for ApplyStats {
    fn add_assign(&mut self, rhs: Self) {
        self.applied += rhs.applied;
        self.ignored += rhs.ignored;
    }
}

// ── SignalTable ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct SignalTable {
    scope:   SignalScope,
    driver:  SignalDriver,
    timing:  SignalTiming,
    signals: BTreeMap<SignalKey, TrafficSignal>,
}

impl SignalTable {
    /// An empty table.  Timing is validated even for externally driven
    /// tables so a config can switch drivers without surprises.
    pub fn new(config: &SignalConfig) -> SignalResult<Self> {
        Ok(Self {
            scope:   config.scope,
            driver:  config.driver,
            timing:  SignalTiming::new(config.red_frames, config.green_frames)?,
            signals: BTreeMap::new(),
        })
    }

    /// A table holding a signal at every node the graph provider tagged.
    pub fn from_tagged_nodes(graph: &RoadGraph, config: &SignalConfig) -> SignalResult<Self> {
        let mut table = Self::new(config)?;
        for node in graph.signal_tagged_nodes() {
            table.insert_node(graph, node)?;
        }
        debug!(
            signals = table.len(),
            scope = ?table.scope,
            "signal table built from tagged nodes"
        );
        Ok(table)
    }

    /// Place a signal at `node`.  Lane scope creates one signal per distinct
    /// successor.  Returns how many signals were added; keys already present
    /// are left untouched.
    pub fn insert_node(&mut self, graph: &RoadGraph, node: NodeId) -> SignalResult<usize> {
        if !graph.contains_node(node) {
            return Err(SignalError::NodeNotFound(node));
        }
        let keys: Vec<SignalKey> = match self.scope {
            SignalScope::Node => vec![SignalKey::Node(node)],
            SignalScope::Lane => graph
                .successors(node)
                .map(|succ| SignalKey::Lane(node, succ))
                .collect(),
        };
        Ok(keys.into_iter().filter(|&k| self.insert_key(k)).count())
    }

    /// Add one signal by key.  Returns `false` if it was already present.
    pub fn insert_key(&mut self, key: SignalKey) -> bool {
        if self.signals.contains_key(&key) {
            return false;
        }
        let timing = match self.driver {
            SignalDriver::SelfDriven => Some(self.timing),
            SignalDriver::External   => None,
        };
        self.signals.insert(key, TrafficSignal::new(key, timing));
        true
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn scope(&self) -> SignalScope {
        self.scope
    }

    pub fn driver(&self) -> SignalDriver {
        self.driver
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn get(&self, key: &SignalKey) -> Option<&TrafficSignal> {
        self.signals.get(key)
    }

    pub fn get_mut(&mut self, key: &SignalKey) -> Option<&mut TrafficSignal> {
        self.signals.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrafficSignal> + '_ {
        self.signals.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = SignalKey> + '_ {
        self.signals.keys().copied()
    }

    /// Distinct nodes carrying at least one signal.
    pub fn nodes(&self) -> BTreeSet<NodeId> {
        self.signals.keys().map(|k| k.node()).collect()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.signals.keys().any(|k| k.node() == node)
    }

    /// State of the signal gating `current → next`, if there is one.
    pub fn state_for_transition(&self, current: NodeId, next: NodeId) -> Option<SignalState> {
        let key = SignalKey::for_transition(self.scope, current, next);
        self.signals.get(&key).map(|s| s.state)
    }

    /// `true` unless a non-green signal gates `current → next`.
    #[inline]
    pub fn permits(&self, current: NodeId, next: NodeId) -> bool {
        self.state_for_transition(current, next)
            .is_none_or(SignalState::is_green)
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Advance every self-driven signal by one frame.  Returns the number of
    /// state flips.
    pub fn tick_all(&mut self) -> usize {
        let mut flips = 0;
        for signal in self.signals.values_mut() {
            if signal.tick() {
                flips += 1;
            }
        }
        flips
    }

    /// Apply one control message.  Unknown keys are skipped.
    pub fn apply(&mut self, message: &ControlMessage) -> ApplyStats {
        let mut stats = ApplyStats::default();
        for (key, &state) in &message.states {
            match self.signals.get_mut(key) {
                Some(signal) => {
                    signal.set_state(state);
                    stats.applied += 1;
                }
                None => {
                    trace!(key = %key, seq = message.seq, "ignoring control for unknown signal");
                    stats.ignored += 1;
                }
            }
        }
        stats
    }

    /// Every signal back to Red with a zeroed timer.
    pub fn reset(&mut self) {
        for signal in self.signals.values_mut() {
            signal.set_state(SignalState::Red);
        }
    }
}
