//! Sync engine errors.

use comet_monitor_chain::ChainError;
use thiserror::Error;

/// Failure of a sync cycle or a read against the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// RPC or network failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed or unexpected chain data.
    #[error("decode error: {0}")]
    Decode(String),

    /// No instance is registered under this id.
    #[error("unknown instance '{0}'")]
    UnknownInstance(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl From<ChainError> for SyncError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Transport(msg) => Self::Transport(msg),
            ChainError::Decode(msg) => Self::Decode(msg),
            ChainError::InvalidEndpoint(endpoint) => {
                Self::Transport(format!("invalid endpoint {}", endpoint))
            }
        }
    }
}
