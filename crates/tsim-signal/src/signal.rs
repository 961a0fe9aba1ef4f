//! The per-key signal state machine.

use std::fmt;

use tsim_core::{NodeId, SignalScope};

use crate::{SignalError, SignalResult};

// ── SignalState ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SignalState {
    #[default]
    Red,
    Green,
}

impl SignalState {
    #[inline]
    pub fn is_green(self) -> bool {
        self == SignalState::Green
    }

    pub fn toggled(self) -> SignalState {
        match self {
            SignalState::Red   => SignalState::Green,
            SignalState::Green => SignalState::Red,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignalState::Red   => "red",
            SignalState::Green => "green",
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── SignalKey ─────────────────────────────────────────────────────────────────

/// What a signal gates.
///
/// `Node(n)` gates every transition into `n`.  `Lane(n, s)` gates only the
/// transition from `n` to its successor `s`, so two lanes leaving the same
/// node are independent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKey {
    Node(NodeId),
    Lane(NodeId, NodeId),
}

impl SignalKey {
    /// The key that gates the transition `current → next` under `scope`.
    #[inline]
    pub fn for_transition(scope: SignalScope, current: NodeId, next: NodeId) -> SignalKey {
        match scope {
            SignalScope::Node => SignalKey::Node(next),
            SignalScope::Lane => SignalKey::Lane(current, next),
        }
    }

    /// The node the signal is drawn at.
    pub fn node(self) -> NodeId {
        match self {
            SignalKey::Node(n) | SignalKey::Lane(n, _) => n,
        }
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKey::Node(n)    => write!(f, "{}", n.0),
            SignalKey::Lane(n, s) => write!(f, "{}->{}", n.0, s.0),
        }
    }
}

// ── SignalTiming ──────────────────────────────────────────────────────────────

/// Phase lengths of a self-driven signal, in frames.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SignalTiming {
    pub red:   u32,
    pub green: u32,
}

impl SignalTiming {
    pub fn new(red: u32, green: u32) -> SignalResult<Self> {
        if red == 0 || green == 0 {
            return Err(SignalError::InvalidTiming { red, green });
        }
        Ok(Self { red, green })
    }

    #[inline]
    pub fn duration(self, state: SignalState) -> u32 {
        match state {
            SignalState::Red   => self.red,
            SignalState::Green => self.green,
        }
    }
}

// ── TrafficSignal ─────────────────────────────────────────────────────────────

/// One signal.  `timer` counts frames spent in the current state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrafficSignal {
    pub key:    SignalKey,
    pub state:  SignalState,
    pub timer:  u32,
    /// `Some` for self-driven signals; `None` signals never tick.
    pub timing: Option<SignalTiming>,
}

impl TrafficSignal {
    /// A signal starting Red with a zeroed timer.
    pub fn new(key: SignalKey, timing: Option<SignalTiming>) -> Self {
        Self { key, state: SignalState::Red, timer: 0, timing }
    }

    /// Advance one frame.  Returns `true` when the state flipped.
    ///
    /// A signal entering Red with `red = R` turns Green on its R-th tick.
    pub fn tick(&mut self) -> bool {
        let Some(timing) = self.timing else {
            return false;
        };
        self.timer += 1;
        if self.timer >= timing.duration(self.state) {
            self.state = self.state.toggled();
            self.timer = 0;
            return true;
        }
        false
    }

    /// Controller write: overwrite the state and restart the timer.
    pub fn set_state(&mut self, state: SignalState) {
        self.state = state;
        self.timer = 0;
    }

    #[inline]
    pub fn is_green(&self) -> bool {
        self.state.is_green()
    }

    #[inline]
    pub fn node(&self) -> NodeId {
        self.key.node()
    }

    pub fn is_self_driven(&self) -> bool {
        self.timing.is_some()
    }
}
