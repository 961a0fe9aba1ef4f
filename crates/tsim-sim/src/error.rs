use thiserror::Error;

use tsim_agent::AgentError;
use tsim_core::{CoreError, Frame};
use tsim_signal::SignalError;

use crate::{ObserverError, RunSummary};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("{what} length {got} does not match agent count {expected}")]
    AgentCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("signal table: {0}")]
    Signal(#[from] SignalError),

    #[error("agent: {0}")]
    Agent(#[from] AgentError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),

    /// An observer hook failed.  The run stopped at `frame`; `summary`
    /// describes the state it stopped in.
    #[error("observer failed at {frame}: {source}")]
    SinkFailed {
        frame:   Frame,
        source:  ObserverError,
        summary: Box<RunSummary>,
    },
}

pub type SimResult<T> = Result<T, SimError>;
