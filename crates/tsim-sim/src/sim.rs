//! The `Sim` struct and its frame loop.

use std::time::Instant;

use tracing::{debug, error, info, trace};

use tsim_agent::{AgentArena, AgentError, AgentRngs, Movement};
use tsim_control::ControlReceiver;
use tsim_core::{AgentId, ArrivalMode, EdgeId, Frame, FrameClock, SimConfig};
use tsim_signal::SignalTable;
use tsim_spatial::{RoadGraph, Router};

use crate::contention::{Candidate, TransitionIndex};
use crate::{
    CongestionAccumulator, FrameObserver, FrameStats, FrameView, ObserverError, RunSummary, SimError,
    SimResult,
};

// ── Per-agent decision produced by the read-only decide phase ─────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Decision {
    /// The next hop is not an edge of the graph.
    Discard,
    SignalBlocked,
    ContentionBlocked(EdgeId),
    Advance(EdgeId),
}

/// Totals carried across frames for the run summary.
#[derive(Clone, Debug, Default)]
struct RunTotals {
    planning_failures:  u64,
    signal_blocked:     u64,
    contention_blocked: u64,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `Sim<R>` owns every piece of per-run state and drives the frame loop:
///
/// 1. **Control**: drain the control channel and apply messages in sequence
///    order (last write wins per key).
/// 2. **Plan**: agents without a next hop pick a random reachable target
///    (bounded retries; failures are counted, not fatal).
/// 3. **Snapshot**: record every active agent's transition and position.
/// 4. **Decide** (optionally parallel with the `parallel` feature): edge
///    check, signal check, then contention check against the snapshot.
/// 5. **Apply** (sequential, ascending `AgentId`): count density, move,
///    block or discard; handle arrivals per [`ArrivalMode`].
/// 6. **Signals**: tick self-driven signals.
/// 7. **Clock**: advance one frame.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<R: Router> {
    /// Run configuration (duration, thresholds, arrival mode, …).
    pub config: SimConfig,

    /// Frame clock.  `current_frame` is the last completed frame.
    pub clock: FrameClock,

    /// Immutable road graph.
    pub graph: RoadGraph,

    /// Path search used for planning.
    pub router: R,

    pub signals: SignalTable,

    /// Per-edge density for the current measurement window.
    pub density: CongestionAccumulator,

    pub agents: AgentArena,

    /// Per-agent deterministic RNGs, separated for the split-borrow pattern.
    pub rngs: AgentRngs,

    pub(crate) control: Option<ControlReceiver>,

    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<rayon::ThreadPool>,

    totals: RunTotals,
}

impl<R: Router> Sim<R> {
    pub(crate) fn assemble(
        config: SimConfig,
        graph: RoadGraph,
        router: R,
        signals: SignalTable,
        agents: AgentArena,
        rngs: AgentRngs,
        control: Option<ControlReceiver>,
        #[cfg(feature = "parallel")] pool: Option<rayon::ThreadPool>,
    ) -> Self {
        Self {
            clock: config.make_clock(),
            density: CongestionAccumulator::new(graph.edge_count()),
            config,
            graph,
            router,
            signals,
            agents,
            rngs,
            control,
            #[cfg(feature = "parallel")]
            pool,
            totals: RunTotals::default(),
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current frame to `config.end_frame()` and return the
    /// run summary.
    ///
    /// `observer.on_run_end` is called exactly once, whether the run
    /// finishes or stops early.  An observer failure stops the loop with
    /// [`SimError::SinkFailed`], which carries the summary at that point.
    pub fn run<O: FrameObserver>(&mut self, observer: &mut O) -> SimResult<RunSummary> {
        let end = self.config.end_frame();
        info!(
            agents = self.agents.len(),
            signals = self.signals.len(),
            edges = self.graph.edge_count(),
            frames = end.0.saturating_sub(self.clock.current_frame.0),
            "run started"
        );

        while self.clock.current_frame < end {
            self.observed_step(observer)?;
        }

        let summary = self.summary();
        if let Err(source) = observer.on_run_end(&summary) {
            error!(error = %source, "observer failed at run end");
            return Err(SimError::SinkFailed {
                frame: self.clock.current_frame,
                source,
                summary: Box::new(summary),
            });
        }
        info!(
            frames = summary.frames,
            arrived = summary.arrived,
            not_arrived = summary.not_arrived,
            total_density = summary.total_density,
            "run finished"
        );
        Ok(summary)
    }

    /// Run exactly `n` frames from the current position (ignores
    /// `end_frame`).  Does not call `on_run_end` unless a hook fails.
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_frames<O: FrameObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.observed_step(observer)?;
        }
        Ok(())
    }

    /// Process one frame without an observer.
    pub fn step(&mut self) -> SimResult<FrameStats> {
        let frame = self.clock.current_frame.next();
        let mut stats = FrameStats { frame, ..FrameStats::default() };
        let density_before = self.density.total();

        // ── Phase 1: drain control messages ───────────────────────────────
        //
        // Only messages queued before this point are applied; anything sent
        // while the frame runs waits for the next frame.
        if let Some(rx) = &self.control {
            stats.control = rx.drain_into(&mut self.signals);
        }

        // ── Phase 2: plan agents without a next hop ───────────────────────
        for i in 0..self.agents.len() {
            let id = AgentId(i as u32);
            if self.agents.is_alive(id) && self.agents.get(id).needs_plan() {
                self.plan_agent(id, &mut stats)?;
            }
        }

        // ── Phase 3: frame-stable snapshot ────────────────────────────────
        let candidates = self.candidates();
        let index = TransitionIndex::build(&candidates);

        // ── Phase 4: decide (read-only) ───────────────────────────────────
        let decisions = self.decide(&candidates, &index);

        // ── Phase 5: apply in ascending AgentId order ─────────────────────
        for (candidate, decision) in candidates.iter().zip(decisions) {
            self.apply(candidate, decision, &mut stats)?;
        }

        // ── Phase 6: self-driven signals ──────────────────────────────────
        stats.signal_flips = self.signals.tick_all();

        // ── Phase 7: clock ────────────────────────────────────────────────
        self.clock.advance();

        stats.total_agents = self.agents.len();
        stats.arrived = self.agents.arrived_count();
        stats.not_arrived = stats.total_agents - stats.arrived;
        stats.density_total = self.density.total();
        debug_assert_eq!(stats.density_total - density_before, stats.attempts as u64);

        self.totals.planning_failures += stats.planning_failures as u64;
        self.totals.signal_blocked += stats.signal_blocked as u64;
        self.totals.contention_blocked += stats.contention_blocked as u64;

        trace!(
            frame = %frame,
            moved = stats.moved,
            signal_blocked = stats.signal_blocked,
            contention_blocked = stats.contention_blocked,
            arrivals = stats.arrivals,
            "frame done"
        );
        Ok(stats)
    }

    /// Read-only view of the current state, as observers see it.
    pub fn view<'a>(&'a self, stats: &'a FrameStats) -> FrameView<'a> {
        FrameView {
            frame:        self.clock.current_frame,
            elapsed_secs: self.clock.elapsed_secs(),
            stats,
            graph:        &self.graph,
            density:      &self.density,
            thresholds:   &self.config.density,
            signals:      &self.signals,
            agents:       &self.agents,
        }
    }

    pub fn summary(&self) -> RunSummary {
        let total_agents = self.agents.len();
        let arrived = self.agents.arrived_count();
        RunSummary {
            frames: self.clock.current_frame.0,
            total_agents,
            arrived,
            not_arrived: total_agents - arrived,
            trips_completed: self.agents.iter().map(|a| a.trips_completed as u64).sum(),
            signals: self.signals.len(),
            edge_density: self.density.as_slice().to_vec(),
            total_density: self.density.total(),
            planning_failures: self.totals.planning_failures,
            signal_blocked: self.totals.signal_blocked,
            contention_blocked: self.totals.contention_blocked,
            max_stall_frames: self.agents.iter_active().map(|a| a.stall_frames).max().unwrap_or(0),
        }
    }

    /// Start a new measurement window.
    pub fn reset_density(&mut self) {
        self.density.reset();
    }

    pub fn set_control(&mut self, receiver: ControlReceiver) {
        self.control = Some(receiver);
    }

    // ── Frame internals ───────────────────────────────────────────────────

    /// One frame plus observer hooks and optional wall-clock pacing.
    fn observed_step<O: FrameObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let started = Instant::now();
        let frame = self.clock.current_frame.next();
        observer.on_frame_start(frame);

        let stats = match self.step() {
            Ok(stats) => stats,
            Err(e) => {
                // Observers still get to release their resources.
                if let Err(source) = observer.on_run_end(&self.summary()) {
                    error!(error = %source, "observer failed at run end");
                }
                return Err(e);
            }
        };

        let interval = self.config.output_interval_frames;
        let hooks = {
            let view = self.view(&stats);
            observer.on_frame_end(&view).and_then(|()| {
                if frame.is_multiple_of(interval) {
                    observer.on_snapshot(&view)
                } else {
                    Ok(())
                }
            })
        };
        if let Err(source) = hooks {
            return Err(self.abort(observer, frame, source));
        }

        if self.config.realtime {
            let budget = self.clock.frame_duration();
            if let Some(rest) = budget.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        Ok(())
    }

    fn abort<O: FrameObserver>(&mut self, observer: &mut O, frame: Frame, source: ObserverError) -> SimError {
        error!(frame = %frame, error = %source, "observer failed; stopping run");
        let summary = self.summary();
        if let Err(end_err) = observer.on_run_end(&summary) {
            error!(error = %end_err, "observer failed at run end");
        }
        SimError::SinkFailed { frame, source, summary: Box::new(summary) }
    }

    fn plan_agent(&mut self, id: AgentId, stats: &mut FrameStats) -> SimResult<()> {
        let agent = self.agents.get_mut(id);
        let rng = self.rngs.get_mut(id);
        match agent.plan_random(&self.graph, &self.router, rng, self.config.max_plan_attempts) {
            Ok(()) => stats.planned += 1,
            Err(AgentError::PlanningFailed { agent, attempts }) => {
                debug!(agent = %agent, attempts, "planning failed; retrying next frame");
                stats.planning_failures += 1;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn candidates(&self) -> Vec<Candidate> {
        self.agents
            .iter_active()
            .filter_map(|a| {
                let next = a.next_hop()?;
                let remaining = if self.graph.contains_node(next) {
                    a.position.distance(self.graph.position(next))
                } else {
                    f32::INFINITY
                };
                Some(Candidate {
                    agent: a.id,
                    current: a.current,
                    next,
                    position: a.position,
                    remaining,
                })
            })
            .collect()
    }

    fn decide(&self, candidates: &[Candidate], index: &TransitionIndex) -> Vec<Decision> {
        let graph = &self.graph;
        let signals = &self.signals;
        let threshold = self.config.proximity_threshold;
        let decide_one = |c: &Candidate| decide(graph, signals, index, threshold, c);

        #[cfg(not(feature = "parallel"))]
        {
            candidates.iter().map(decide_one).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            // Indexed collect keeps candidate order.
            let run = || candidates.par_iter().map(decide_one).collect::<Vec<_>>();
            match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            }
        }
    }

    fn apply(&mut self, c: &Candidate, decision: Decision, stats: &mut FrameStats) -> SimResult<()> {
        let agent = self.agents.get_mut(c.agent);
        match decision {
            Decision::Discard => {
                debug!(agent = %c.agent, from = %c.current, to = %c.next, "no such edge; discarding path");
                agent.discard_path();
                stats.discarded += 1;
            }
            Decision::SignalBlocked => {
                agent.block();
                stats.signal_blocked += 1;
            }
            Decision::ContentionBlocked(edge) => {
                self.density.record(edge);
                agent.block();
                stats.attempts += 1;
                stats.contention_blocked += 1;
            }
            Decision::Advance(edge) => {
                self.density.record(edge);
                stats.attempts += 1;
                stats.moved += 1;
                let next_pos = self.graph.position(c.next);
                if let Movement::ReachedTarget(target) = agent.advance(c.next, next_pos) {
                    trace!(agent = %c.agent, target = %target, "arrived");
                    stats.arrivals += 1;
                    self.on_arrival(c.agent, stats)?;
                }
            }
        }
        Ok(())
    }

    fn on_arrival(&mut self, id: AgentId, stats: &mut FrameStats) -> SimResult<()> {
        match self.config.arrival_mode {
            ArrivalMode::Retain => {}
            ArrivalMode::Remove => self.agents.retire(id),
            ArrivalMode::Replan => {
                self.agents.get_mut(id).restart();
                self.plan_agent(id, stats)?;
            }
        }
        Ok(())
    }
}

/// Edge check, then signal check, then contention check.
fn decide(
    graph: &RoadGraph,
    signals: &SignalTable,
    index: &TransitionIndex,
    threshold: f32,
    c: &Candidate,
) -> Decision {
    let Some(edge) = graph.find_edge(c.current, c.next) else {
        return Decision::Discard;
    };
    if !signals.permits(c.current, c.next) {
        return Decision::SignalBlocked;
    }
    if index.is_blocked(c, threshold) {
        return Decision::ContentionBlocked(edge);
    }
    Decision::Advance(edge)
}
