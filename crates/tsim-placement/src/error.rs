use thiserror::Error;

use tsim_signal::SignalError;
use tsim_sim::SimError;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("simulation run failed: {0}")]
    Sim(#[from] SimError),

    #[error("signal table: {0}")]
    Signal(#[from] SignalError),

    #[error("need {wanted} candidate nodes, only {available} available")]
    NotEnoughCandidates { wanted: usize, available: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type PlacementResult<T> = Result<T, PlacementError>;
