//! Agent-subsystem error type.

use thiserror::Error;

use tsim_core::{AgentId, NodeId};
use tsim_spatial::SpatialError;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Every sampled target was unreachable.  Recoverable: the agent tries
    /// again on a later frame.
    #[error("{agent} found no reachable target after {attempts} attempts")]
    PlanningFailed { agent: AgentId, attempts: u32 },

    #[error("cannot spawn agents on an empty graph")]
    EmptyGraph,

    #[error("spawn node {0} not in graph")]
    NodeNotFound(NodeId),

    #[error(transparent)]
    Routing(#[from] SpatialError),
}

pub type AgentResult<T> = Result<T, AgentError>;
