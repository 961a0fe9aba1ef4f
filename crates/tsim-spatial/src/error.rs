//! Spatial-subsystem error type.

use thiserror::Error;

use tsim_core::NodeId;

#[derive(Debug, Error)]
pub enum SpatialError {
    /// `to` is not reachable from `from`.  Expected and frequent on directed
    /// graphs that are not strongly connected.
    #[error("no path from {from} to {to}")]
    NoPathFound { from: NodeId, to: NodeId },

    #[error("node {0} not found in graph")]
    NodeNotFound(NodeId),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
