//! Signal controllers: policies that decide desired signal states.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tsim_signal::{ControlMessage, SignalKey, SignalState};

/// Time since the Unix epoch.  A clock set before 1970 reads as zero.
pub fn wall_clock() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// A policy producing signal snapshots on its own cadence.
///
/// # Thread safety
///
/// Controllers are moved onto their own thread by
/// [`spawn_controller`](crate::spawn_controller), hence `Send + 'static`.
pub trait SignalController: Send + 'static {
    /// Desired states for `keys` at wall-clock time `now`.
    fn decide(&mut self, keys: &[SignalKey], now: Duration) -> ControlMessage;

    /// Pause between two decisions.
    fn interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    /// Used to name the controller thread.
    fn name(&self) -> &str {
        "controller"
    }
}

// ── PeriodicSplitController ───────────────────────────────────────────────────

/// All signals Green for the first `green_secs` whole seconds of every
/// `period_secs` window of wall-clock time, Red for the rest.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PeriodicSplitController {
    period_secs: u64,
    green_secs:  u64,
    interval:    Duration,
}

impl PeriodicSplitController {
    /// `period_secs` is raised to at least 1 and `green_secs` capped at the
    /// period.
    pub fn new(period_secs: u64, green_secs: u64) -> Self {
        let period_secs = period_secs.max(1);
        Self {
            period_secs,
            green_secs: green_secs.min(period_secs),
            interval: Duration::from_secs(1),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn state_at(&self, now: Duration) -> SignalState {
        if now.as_secs() % self.period_secs < self.green_secs {
            SignalState::Green
        } else {
            SignalState::Red
        }
    }
}

impl Default for PeriodicSplitController {
    /// Ten-second period, half green.
    fn default() -> Self {
        Self::new(10, 5)
    }
}

impl SignalController for PeriodicSplitController {
    fn decide(&mut self, keys: &[SignalKey], now: Duration) -> ControlMessage {
        ControlMessage::uniform(keys.iter().copied(), self.state_at(now))
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn name(&self) -> &str {
        "periodic-split"
    }
}
