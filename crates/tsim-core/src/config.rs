//! Run configuration.
//!
//! Every field has a default so a TOML file only needs to name what it
//! changes:
//!
//! ```toml
//! agent_count = 100
//! duration_secs = 60.0
//!
//! [signals]
//! scope = "lane"
//! driver = "external"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, Frame, FrameClock};

// ── Enumerated settings ───────────────────────────────────────────────────────

/// What happens to an agent once it reaches its target.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalMode {
    /// Stays in the population with status `Arrived`; no further updates and
    /// not part of the contention scan.
    #[default]
    Retain,
    /// Leaves the active population; still counted in the run summary.
    Remove,
    /// Counts a completed trip and immediately picks a new random target.
    Replan,
}

/// How signal keys are scoped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalScope {
    /// One signal per node, gating every transition *into* that node.
    #[default]
    Node,
    /// One signal per `(node, successor)` pair, gating only that lane.
    Lane,
}

/// Who advances signal states.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalDriver {
    /// Each signal runs its own red/green timer every frame.
    #[default]
    SelfDriven,
    /// States change only when a control message names the signal.
    External,
}

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub scope:        SignalScope,
    pub driver:       SignalDriver,
    /// Red phase length for self-driven signals, in frames.
    pub red_frames:   u32,
    /// Green phase length for self-driven signals, in frames.
    pub green_frames: u32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            scope:        SignalScope::Node,
            driver:       SignalDriver::SelfDriven,
            red_frames:   15,
            green_frames: 15,
        }
    }
}

/// Density thresholds used to bucket edge counters into low/medium/high.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Counts at or above this are "medium".
    pub medium: u64,
    /// Counts at or above this are "high".
    pub high:   u64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self { medium: 5, high: 10 }
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Target frames per simulated second.
    pub frame_rate: u32,

    /// Length of one run in simulated seconds.
    pub duration_secs: f64,

    /// Master RNG seed.  The same seed always produces identical runs.
    pub seed: u64,

    /// Number of agents spawned when the builder is not given a population.
    pub agent_count: usize,

    /// Per-agent speed is drawn uniformly from `[speed_min, speed_max)`
    /// render units per frame.
    pub speed_min: f32,
    pub speed_max: f32,

    /// Two agents on the same transition closer than this block each other.
    pub proximity_threshold: f32,

    /// Random targets tried before planning gives up for the frame.
    pub max_plan_attempts: u32,

    /// Use edge weights (lengths) for shortest paths instead of hop count.
    pub weighted_paths: bool,

    pub arrival_mode: ArrivalMode,

    /// Edge length of the square render canvas.
    pub canvas_size: f32,

    /// Sleep out the remainder of each frame to hold `frame_rate` in wall time.
    pub realtime: bool,

    /// Observer snapshot cadence in frames.  0 disables snapshots.
    pub output_interval_frames: u64,

    /// Rayon worker count for the decide phase.  `None` uses all cores.
    pub num_threads: Option<usize>,

    pub signals: SignalConfig,

    pub density: DensityConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frame_rate:             30,
            duration_secs:          300.0,
            seed:                   42,
            agent_count:            250,
            speed_min:              1.0,
            speed_max:              2.0,
            proximity_threshold:    10.0,
            max_plan_attempts:      32,
            weighted_paths:         false,
            arrival_mode:           ArrivalMode::Retain,
            canvas_size:            800.0,
            realtime:               false,
            output_interval_frames: 30,
            num_threads:            None,
            signals:                SignalConfig::default(),
            density:                DensityConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let config: SimConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.frame_rate == 0 {
            return Err(CoreError::Config("frame_rate must be positive".into()));
        }
        if !(self.duration_secs > 0.0) {
            return Err(CoreError::Config("duration_secs must be positive".into()));
        }
        if !(self.speed_min > 0.0) || self.speed_min > self.speed_max {
            return Err(CoreError::Config(format!(
                "invalid speed range [{}, {})",
                self.speed_min, self.speed_max
            )));
        }
        if self.proximity_threshold < 0.0 {
            return Err(CoreError::Config("proximity_threshold must not be negative".into()));
        }
        if self.max_plan_attempts == 0 {
            return Err(CoreError::Config("max_plan_attempts must be at least 1".into()));
        }
        if self.density.medium > self.density.high {
            return Err(CoreError::Config("density.medium must not exceed density.high".into()));
        }
        Ok(())
    }

    /// Number of frames in one run.
    pub fn total_frames(&self) -> u64 {
        self.make_clock().frames_for_secs(self.duration_secs)
    }

    /// The frame at which the run ends (inclusive: the last stepped frame).
    pub fn end_frame(&self) -> Frame {
        Frame(self.total_frames())
    }

    pub fn make_clock(&self) -> FrameClock {
        FrameClock::new(self.frame_rate)
    }
}
