//! Controller → simulation messages.

use std::collections::BTreeMap;

use crate::{SignalKey, SignalState};

/// Desired states for some or all signal keys.
///
/// `seq` records production order.  It is stamped by the sending side of the
/// control channel; messages built by hand start at 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControlMessage {
    pub seq:    u64,
    pub states: BTreeMap<SignalKey, SignalState>,
}

impl ControlMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key in `keys` set to `state`.
    pub fn uniform(keys: impl IntoIterator<Item = SignalKey>, state: SignalState) -> Self {
        Self {
            seq:    0,
            states: keys.into_iter().map(|k| (k, state)).collect(),
        }
    }

    pub fn with(mut self, key: SignalKey, state: SignalState) -> Self {
        self.states.insert(key, state);
        self
    }

    /// Later assignments to the same key replace earlier ones.
    pub fn set(&mut self, key: SignalKey, state: SignalState) {
        self.states.insert(key, state);
    }

    /// Fold `later` into `self`, letting `later` win on shared keys.
    pub fn merge(&mut self, later: ControlMessage) {
        self.seq = self.seq.max(later.seq);
        self.states.extend(later.states);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl FromIterator<(SignalKey, SignalState)> for ControlMessage {
    fn from_iter<I: IntoIterator<Item = (SignalKey, SignalState)>>(iter: I) -> Self {
        Self { seq: 0, states: iter.into_iter().collect() }
    }
}
