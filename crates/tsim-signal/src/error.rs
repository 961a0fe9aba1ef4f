//! Signal-subsystem error type.

use thiserror::Error;

use tsim_core::NodeId;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("cannot place a signal at {0}: node not in graph")]
    NodeNotFound(NodeId),

    /// Self-driven phases must last at least one frame.
    #[error("invalid signal timing: red {red} frames, green {green} frames")]
    InvalidTiming { red: u32, green: u32 },
}

pub type SignalResult<T> = Result<T, SignalError>;
