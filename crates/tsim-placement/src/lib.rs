//! `tsim-placement` — choosing where signals go, between runs.
//!
//! A [`PlacementPolicy`] looks at a finished baseline run and returns nodes
//! that should get a signal.  [`PlacementExperiment`] wires the two runs
//! together and reports a [`Comparison`].
//!
//! | Policy                | Picks                                                     |
//! |-----------------------|-----------------------------------------------------------|
//! | [`DensityRanked`]     | endpoints of the top-K congested edges (K = 15)           |
//! | [`DegreeRanked`]      | highest-degree unsignalled nodes (10)                     |
//! | [`RandomPlacement`]   | random unsignalled nodes of degree ≥ 4 (20 in the demo)   |
//! | [`QLearningPlacement`]| best layout found by tabular Q-learning (experimental)    |

pub mod error;
pub mod experiment;
pub mod policy;
pub mod qlearning;


pub use error::{PlacementError, PlacementResult};
pub use experiment::{Comparison, ExperimentReport, PlacementExperiment, improvement_pct};
pub use policy::{DegreeRanked, DensityRanked, PlacementContext, PlacementPolicy, RandomPlacement, apply_placement};
pub use qlearning::{
    Action, DensityScorer, IndependentRunScorer, LayoutRunScorer, QLearningConfig, QLearningPlacement,
    TrainingReport, reward,
};
