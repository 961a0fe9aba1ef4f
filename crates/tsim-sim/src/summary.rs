//! Per-frame statistics and the end-of-run summary.

use tsim_control::DrainStats;
use tsim_core::{EdgeId, Frame};

use crate::congestion::rank;

// ── FrameStats ────────────────────────────────────────────────────────────────

/// What happened during one frame.
///
/// `attempts` equals the growth of the congestion total over the frame:
/// every moved or contention-blocked agent counts once.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: Frame,

    // ── Control ───────────────────────────────────────────────────────────
    pub control:      DrainStats,
    pub signal_flips: usize,

    // ── Planning ──────────────────────────────────────────────────────────
    pub planned:           usize,
    pub planning_failures: usize,

    // ── Movement ──────────────────────────────────────────────────────────
    pub attempts:           usize,
    pub moved:              usize,
    pub signal_blocked:     usize,
    pub contention_blocked: usize,
    /// Paths dropped because their next edge does not exist.
    pub discarded:          usize,
    pub arrivals:           usize,

    // ── Population after the frame ────────────────────────────────────────
    pub total_agents:  usize,
    pub arrived:       usize,
    pub not_arrived:   usize,
    pub density_total: u64,
}

// ── RunSummary ────────────────────────────────────────────────────────────────

/// Scoring material for one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub frames:          u64,
    pub total_agents:    usize,
    pub arrived:         usize,
    pub not_arrived:     usize,
    pub trips_completed: u64,
    pub signals:         usize,

    /// Final counter per edge, indexed by `EdgeId`.
    pub edge_density:  Vec<u64>,
    pub total_density: u64,

    pub planning_failures:  u64,
    pub signal_blocked:     u64,
    pub contention_blocked: u64,
    /// Longest blocked streak of any agent still waiting at the end.
    pub max_stall_frames:   u32,
}

impl RunSummary {
    pub fn arrived_pct(&self) -> f64 {
        pct(self.arrived, self.total_agents)
    }

    pub fn not_arrived_pct(&self) -> f64 {
        pct(self.not_arrived, self.total_agents)
    }

    /// Edges by descending final density.
    pub fn ranked_edges(&self) -> Vec<(EdgeId, u64)> {
        rank(&self.edge_density)
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total agents:       {}", self.total_agents)?;
        writeln!(f, "Reached target:     {} ({:.2}%)", self.arrived, self.arrived_pct())?;
        writeln!(f, "Did not reach:      {} ({:.2}%)", self.not_arrived, self.not_arrived_pct())?;
        writeln!(f, "Trips completed:    {}", self.trips_completed)?;
        write!(f, "Total density:      {}", self.total_density)
    }
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
