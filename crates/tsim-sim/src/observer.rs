//! Frame observers and the read-only view they receive.

use tsim_agent::{AgentArena, AgentStatus};
use tsim_core::{AgentId, DensityConfig, EdgeId, Frame, NodeId, RenderPoint, RoadClass};
use tsim_signal::{SignalKey, SignalState, SignalTable};
use tsim_spatial::RoadGraph;

use crate::{CongestionAccumulator, DensityLevel, FrameStats, RunSummary};

/// Boxed error returned by observer hooks.  Any observer failure ends the run.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// frame loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct Progress;
///
/// impl FrameObserver for Progress {
///     fn on_frame_end(&mut self, view: &FrameView<'_>) -> Result<(), ObserverError> {
///         if view.frame.is_multiple_of(300) {
///             println!("{}: density {}", view.frame, view.stats.density_total);
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait FrameObserver {
    /// Called before any processing of `frame`.
    fn on_frame_start(&mut self, _frame: Frame) {}

    /// Called after every frame with the post-frame state.
    fn on_frame_end(&mut self, _view: &FrameView<'_>) -> Result<(), ObserverError> {
        Ok(())
    }

    /// Called every `config.output_interval_frames` frames, after
    /// `on_frame_end`.
    fn on_snapshot(&mut self, _view: &FrameView<'_>) -> Result<(), ObserverError> {
        Ok(())
    }

    /// Called exactly once per `run`, on every exit path, including after an
    /// earlier hook failed.  Release external resources here.
    fn on_run_end(&mut self, _summary: &RunSummary) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// A [`FrameObserver`] that does nothing.
pub struct NoopObserver;

impl FrameObserver for NoopObserver {}

// ── FrameView ─────────────────────────────────────────────────────────────────

/// Read-only snapshot of the world after a frame.
pub struct FrameView<'a> {
    pub frame:        Frame,
    pub elapsed_secs: f64,
    pub stats:        &'a FrameStats,
    pub graph:        &'a RoadGraph,
    pub density:      &'a CongestionAccumulator,
    pub thresholds:   &'a DensityConfig,
    pub signals:      &'a SignalTable,
    pub agents:       &'a AgentArena,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeView {
    pub edge:     EdgeId,
    pub from:     NodeId,
    pub to:       NodeId,
    pub from_pos: RenderPoint,
    pub to_pos:   RenderPoint,
    pub class:    RoadClass,
    pub density:  u64,
    pub level:    DensityLevel,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SignalView {
    pub key:      SignalKey,
    pub position: RenderPoint,
    pub state:    SignalState,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AgentView {
    pub id:       AgentId,
    pub current:  NodeId,
    pub position: RenderPoint,
    pub status:   AgentStatus,
}

impl<'a> FrameView<'a> {
    pub fn edges(&self) -> impl Iterator<Item = EdgeView> + '_ {
        self.graph.edges().map(move |(edge, from, to)| {
            let density = self.density.get(edge);
            EdgeView {
                edge,
                from,
                to,
                from_pos: self.graph.position(from),
                to_pos:   self.graph.position(to),
                class:    self.graph.edge_class[edge.index()],
                density,
                level:    DensityLevel::classify(density, self.thresholds),
            }
        })
    }

    pub fn signals(&self) -> impl Iterator<Item = SignalView> + '_ {
        self.signals.iter().map(move |s| SignalView {
            key:      s.key,
            position: self.graph.position(s.node()),
            state:    s.state,
        })
    }

    /// Agents still in the population (retired agents are hidden).
    pub fn agents(&self) -> impl Iterator<Item = AgentView> + '_ {
        self.agents.iter_alive().map(|a| AgentView {
            id:       a.id,
            current:  a.current,
            position: a.position,
            status:   a.status,
        })
    }
}
