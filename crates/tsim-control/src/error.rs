//! Control-channel error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    /// The receiving simulation has been dropped.
    #[error("control channel disconnected")]
    Disconnected,

    #[error("failed to spawn controller thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type ControlResult<T> = Result<T, ControlError>;
