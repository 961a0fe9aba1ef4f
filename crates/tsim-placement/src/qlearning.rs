//! Tabular Q-learning over candidate signal layouts.
//!
//! A *state* is an unordered sample of `layout_size` candidate nodes (stored
//! sorted).  The *action* is [`Action::Skip`] (0) or [`Action::Place`] (1).
//! Each episode samples a state, picks an action epsilon-greedily, asks a
//! [`DensityScorer`] for the aggregate density of a run, turns it into a
//! reward against a fixed baseline, samples a next state and applies the
//! one-step update
//!
//! ```text
//! Q[s][a] += α · (r + γ · max Q[s'] − Q[s][a])
//! ```
//!
//! # Reward coupling
//!
//! How much the learned values mean depends entirely on the scorer.
//! [`IndependentRunScorer`] runs an unrelated simulation that never receives
//! the sampled layout, so its rewards carry no information about the state or
//! the action.  [`LayoutRunScorer`] does place the layout when the action is
//! `Place`.  Pick deliberately.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use tsim_core::{NodeId, SimConfig, SimRng};
use tsim_sim::NoopObserver;
use tsim_spatial::{RoadGraph, Router};

use crate::{PlacementContext, PlacementError, PlacementExperiment, PlacementPolicy, PlacementResult};

/// What to do with a sampled layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Skip,
    Place,
}

impl Action {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Action::Skip  => 0,
            Action::Place => 1,
        }
    }
}

/// `(b - d) / b * 100` when the run beat the baseline, `-10` otherwise.
pub fn reward(baseline: u64, density: u64) -> f64 {
    if density < baseline {
        (baseline - density) as f64 / baseline as f64 * 100.0
    } else {
        -10.0
    }
}

// ── Scorers ───────────────────────────────────────────────────────────────────

/// Produces the aggregate density used to reward one episode.
pub trait DensityScorer {
    fn score(&mut self, layout: &[NodeId], action: Action) -> PlacementResult<u64>;
}

/// Runs a fresh simulation with the graph's tagged signals and a new seed per
/// call.
///
/// **The layout and action are ignored.**  Rewards therefore do not depend on
/// what was sampled, and the Q-table learns nothing about placement.  This
/// mirrors a known gap in the reward loop and is kept so that gap stays
/// visible; use [`LayoutRunScorer`] for a scorer that reflects the layout.
pub struct IndependentRunScorer<R: Router + Clone> {
    experiment: PlacementExperiment<R>,
    runs:       u64,
}

impl<R: Router + Clone> IndependentRunScorer<R> {
    pub fn new(config: SimConfig, graph: RoadGraph, router: R) -> Self {
        Self { experiment: PlacementExperiment::new(config, graph, router), runs: 0 }
    }
}

impl<R: Router + Clone> DensityScorer for IndependentRunScorer<R> {
    fn score(&mut self, layout: &[NodeId], action: Action) -> PlacementResult<u64> {
        if self.runs == 0 {
            warn!("IndependentRunScorer ignores the sampled layout and action; rewards are decoupled from the Q-table state");
        }
        let seed = self.experiment.config.seed.wrapping_add(self.runs);
        self.runs += 1;

        let mut experiment = self.experiment.clone();
        experiment.config.seed = seed;
        let table = experiment.baseline_table()?;
        let summary = experiment.run_with(table, &mut NoopObserver)?;
        debug!(seed, layout = layout.len(), ?action, density = summary.total_density, "independent run scored");
        Ok(summary.total_density)
    }
}

/// Runs the configured simulation with the layout placed on top of the
/// tagged signals when the action is `Place`, and without it on `Skip`.
/// Every call uses the same seed.
pub struct LayoutRunScorer<R: Router + Clone> {
    experiment: PlacementExperiment<R>,
}

impl<R: Router + Clone> LayoutRunScorer<R> {
    pub fn new(experiment: PlacementExperiment<R>) -> Self {
        Self { experiment }
    }
}

impl<R: Router + Clone> DensityScorer for LayoutRunScorer<R> {
    fn score(&mut self, layout: &[NodeId], action: Action) -> PlacementResult<u64> {
        let table = match action {
            Action::Place => self.experiment.table_with(layout)?,
            Action::Skip  => self.experiment.baseline_table()?,
        };
        let summary = self.experiment.run_with(table, &mut NoopObserver)?;
        Ok(summary.total_density)
    }
}

// ── QLearningPlacement ────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct QLearningConfig {
    /// Learning rate α.
    pub alpha:            f64,
    /// Discount factor γ.
    pub gamma:            f64,
    /// Exploration probability ε.
    pub epsilon:          f64,
    /// Nodes per sampled layout (K).
    pub layout_size:      usize,
    /// Aggregate density of the reference run without added signals.
    pub baseline_density: u64,
    pub episodes:         u64,
    pub seed:             u64,
    /// Progress is logged every this many episodes.
    pub log_every:        u64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha:            0.1,
            gamma:            0.9,
            epsilon:          0.1,
            layout_size:      15,
            baseline_density: 14_596,
            episodes:         1_000,
            seed:             42,
            log_every:        1_000,
        }
    }
}

impl QLearningConfig {
    pub fn validate(&self) -> PlacementResult<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(PlacementError::InvalidParameter(format!("alpha {} not in (0, 1]", self.alpha)));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(PlacementError::InvalidParameter(format!("gamma {} not in [0, 1]", self.gamma)));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(PlacementError::InvalidParameter(format!("epsilon {} not in [0, 1]", self.epsilon)));
        }
        if self.layout_size == 0 {
            return Err(PlacementError::InvalidParameter("layout_size must be at least 1".into()));
        }
        if self.baseline_density == 0 {
            return Err(PlacementError::InvalidParameter("baseline_density must be positive".into()));
        }
        Ok(())
    }
}

/// Result of [`QLearningPlacement::train`].
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingReport {
    pub episodes:    u64,
    /// Distinct layouts in the Q-table.
    pub states:      usize,
    pub mean_reward: f64,
    pub best_layout: Vec<NodeId>,
    pub best_value:  f64,
}

/// Epsilon-greedy tabular Q-learning over layouts.
///
/// Optional and experimental: see the module docs for how the scorer decides
/// whether the learned values are meaningful.
pub struct QLearningPlacement {
    config:   QLearningConfig,
    table:    BTreeMap<Vec<NodeId>, [f64; 2]>,
    rng:      SimRng,
    episodes: u64,
}

impl QLearningPlacement {
    pub fn new(config: QLearningConfig) -> PlacementResult<Self> {
        config.validate()?;
        Ok(Self {
            rng: SimRng::new(config.seed),
            config,
            table: BTreeMap::new(),
            episodes: 0,
        })
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    /// Number of layouts seen so far.
    pub fn states(&self) -> usize {
        self.table.len()
    }

    pub fn q_values(&self, layout: &[NodeId]) -> Option<[f64; 2]> {
        self.table.get(layout).copied()
    }

    /// The layout with the highest Q-value for any action.  Ties keep the
    /// first layout in sorted order.
    pub fn best_layout(&self) -> Option<(&[NodeId], f64)> {
        let mut best: Option<(&[NodeId], f64)> = None;
        for (layout, values) in &self.table {
            let value = values[0].max(values[1]);
            if best.is_none_or(|(_, b)| value > b) {
                best = Some((layout.as_slice(), value));
            }
        }
        best
    }

    /// Run `config.episodes` episodes drawing layouts from `candidates`.
    pub fn train<S: DensityScorer + ?Sized>(
        &mut self,
        candidates: &[NodeId],
        scorer: &mut S,
    ) -> PlacementResult<TrainingReport> {
        let episodes = self.config.episodes;
        let mut total_reward = 0.0;
        for _ in 0..episodes {
            total_reward += self.episode(candidates, scorer)?;
        }

        let (best_layout, best_value) = match self.best_layout() {
            Some((layout, value)) => (layout.to_vec(), value),
            None => (Vec::new(), 0.0),
        };
        let report = TrainingReport {
            episodes,
            states: self.table.len(),
            mean_reward: if episodes == 0 { 0.0 } else { total_reward / episodes as f64 },
            best_layout,
            best_value,
        };
        info!(
            episodes = report.episodes,
            states = report.states,
            mean_reward = report.mean_reward,
            best_value = report.best_value,
            "q-learning finished"
        );
        Ok(report)
    }

    /// One sample → act → score → update step.  Returns the reward.
    pub fn episode<S: DensityScorer + ?Sized>(
        &mut self,
        candidates: &[NodeId],
        scorer: &mut S,
    ) -> PlacementResult<f64> {
        let k = self.config.layout_size;
        if candidates.len() < k {
            return Err(PlacementError::NotEnoughCandidates { wanted: k, available: candidates.len() });
        }

        let state = self.sample_layout(candidates);
        let values = *self.table.entry(state.clone()).or_insert([0.0; 2]);
        let action = if self.rng.gen_bool(self.config.epsilon) {
            if self.rng.gen_bool(0.5) { Action::Place } else { Action::Skip }
        } else {
            greedy(&values)
        };

        let density = scorer.score(&state, action)?;
        let r = reward(self.config.baseline_density, density);

        let next = self.sample_layout(candidates);
        let next_values = *self.table.entry(next).or_insert([0.0; 2]);
        let next_best = next_values[greedy(&next_values).index()];

        let (alpha, gamma) = (self.config.alpha, self.config.gamma);
        if let Some(q) = self.table.get_mut(&state) {
            let a = action.index();
            q[a] += alpha * (r + gamma * next_best - q[a]);
        }

        if self.episodes % self.config.log_every.max(1) == 0 {
            info!(episode = self.episodes, reward = r, density, ?action, "q-learning progress");
        }
        self.episodes += 1;
        Ok(r)
    }

    fn sample_layout(&mut self, candidates: &[NodeId]) -> Vec<NodeId> {
        let mut layout = self.rng.sample(candidates, self.config.layout_size);
        layout.sort_unstable();
        layout
    }
}

/// Argmax over the two actions; ties pick `Skip`.
fn greedy(values: &[f64; 2]) -> Action {
    if values[1] > values[0] { Action::Place } else { Action::Skip }
}

impl PlacementPolicy for QLearningPlacement {
    /// The best layout learned so far, or nothing before training.
    fn select(&mut self, _ctx: &PlacementContext<'_>) -> Vec<NodeId> {
        self.best_layout().map(|(layout, _)| layout.to_vec()).unwrap_or_default()
    }

    fn name(&self) -> &str {
        "q-learning"
    }
}
