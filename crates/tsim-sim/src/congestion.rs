//! Per-edge congestion counters.

use tsim_core::{DensityConfig, EdgeId};

// ── DensityLevel ──────────────────────────────────────────────────────────────

/// Bucketed density, for colour-coding edges.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DensityLevel {
    Low,
    Medium,
    High,
}

impl DensityLevel {
    pub fn classify(count: u64, thresholds: &DensityConfig) -> Self {
        if count >= thresholds.high {
            DensityLevel::High
        } else if count >= thresholds.medium {
            DensityLevel::Medium
        } else {
            DensityLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DensityLevel::Low    => "low",
            DensityLevel::Medium => "medium",
            DensityLevel::High   => "high",
        }
    }
}

// ── CongestionAccumulator ─────────────────────────────────────────────────────

/// One counter per directed edge, indexed by `EdgeId`.
///
/// Counts every transition attempt on the edge: agents that moved along it
/// and agents held back by contention on it.  Signal-blocked agents are not
/// counted.  Only the frame loop writes to it, during the sequential apply
/// phase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CongestionAccumulator {
    counts: Vec<u64>,
}

impl CongestionAccumulator {
    pub fn new(edge_count: usize) -> Self {
        Self { counts: vec![0; edge_count] }
    }

    #[inline]
    pub fn record(&mut self, edge: EdgeId) {
        self.counts[edge.index()] += 1;
    }

    #[inline]
    pub fn get(&self, edge: EdgeId) -> u64 {
        self.counts[edge.index()]
    }

    /// Aggregate congestion: the sum of all counters.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Start a new measurement window.
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (EdgeId(i as u32), c))
    }

    pub fn level(&self, edge: EdgeId, thresholds: &DensityConfig) -> DensityLevel {
        DensityLevel::classify(self.get(edge), thresholds)
    }

    /// Edges by descending count; equal counts keep ascending `EdgeId`.
    pub fn ranked(&self) -> Vec<(EdgeId, u64)> {
        rank(&self.counts)
    }
}

/// Rank a per-edge count slice.  Shared with `RunSummary`.
pub(crate) fn rank(counts: &[u64]) -> Vec<(EdgeId, u64)> {
    let mut ranked: Vec<(EdgeId, u64)> = counts
        .iter()
        .enumerate()
        .map(|(i, &c)| (EdgeId(i as u32), c))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}
