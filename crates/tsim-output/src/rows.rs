//! Plain data row types written by output backends.

use tsim_sim::{DensityLevel, EdgeView, FrameStats, RunSummary};

/// One edge's congestion counter at a snapshot frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDensityRow {
    pub frame:   u64,
    pub edge:    u32,
    pub from:    u32,
    pub to:      u32,
    pub density: u64,
    pub level:   DensityLevel,
}

impl EdgeDensityRow {
    pub fn new(frame: u64, edge: &EdgeView) -> Self {
        Self {
            frame,
            edge:    edge.edge.0,
            from:    edge.from.0,
            to:      edge.to.0,
            density: edge.density,
            level:   edge.level,
        }
    }
}

/// What happened in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSummaryRow {
    pub frame:              u64,
    pub elapsed_secs:       f64,
    pub control_messages:   u64,
    pub signal_flips:       u64,
    pub planning_failures:  u64,
    pub moved:              u64,
    pub signal_blocked:     u64,
    pub contention_blocked: u64,
    pub arrivals:           u64,
    pub arrived:            u64,
    pub not_arrived:        u64,
    pub density_total:      u64,
}

impl FrameSummaryRow {
    pub fn new(stats: &FrameStats, elapsed_secs: f64) -> Self {
        Self {
            frame:              stats.frame.0,
            elapsed_secs,
            control_messages:   stats.control.messages as u64,
            signal_flips:       stats.signal_flips as u64,
            planning_failures:  stats.planning_failures as u64,
            moved:              stats.moved as u64,
            signal_blocked:     stats.signal_blocked as u64,
            contention_blocked: stats.contention_blocked as u64,
            arrivals:           stats.arrivals as u64,
            arrived:            stats.arrived as u64,
            not_arrived:        stats.not_arrived as u64,
            density_total:      stats.density_total,
        }
    }
}

/// The single row describing a finished (or stopped) run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummaryRow {
    pub frames:             u64,
    pub total_agents:       u64,
    pub arrived:            u64,
    pub not_arrived:        u64,
    pub arrived_pct:        f64,
    pub trips_completed:    u64,
    pub signals:            u64,
    pub total_density:      u64,
    pub planning_failures:  u64,
    pub signal_blocked:     u64,
    pub contention_blocked: u64,
    pub max_stall_frames:   u32,
}

impl From<&RunSummary> for RunSummaryRow {
    fn from(s: &RunSummary) -> Self {
        Self {
            frames:             s.frames,
            total_agents:       s.total_agents as u64,
            arrived:            s.arrived as u64,
            not_arrived:        s.not_arrived as u64,
            arrived_pct:        s.arrived_pct(),
            trips_completed:    s.trips_completed,
            signals:            s.signals as u64,
            total_density:      s.total_density,
            planning_failures:  s.planning_failures,
            signal_blocked:     s.signal_blocked,
            contention_blocked: s.contention_blocked,
            max_stall_frames:   s.max_stall_frames,
        }
    }
}
