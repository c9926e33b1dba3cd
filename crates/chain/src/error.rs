//! Error taxonomy for chain reads.

use thiserror::Error;

/// Failure of a chain read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// RPC or network failure, including provider-side timeouts.
    #[error("transport error: {0}")]
    Transport(String),

    /// Return data could not be decoded or did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The configured RPC endpoint is not a valid URL.
    #[error("invalid rpc endpoint '{0}'")]
    InvalidEndpoint(String),
}

pub type ChainResult<T> = std::result::Result<T, ChainError>;

impl From<alloy::transports::TransportError> for ChainError {
    fn from(err: alloy::transports::TransportError) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<alloy::contract::Error> for ChainError {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(e) => Self::Transport(e.to_string()),
            other => Self::Decode(other.to_string()),
        }
    }
}

impl From<alloy::sol_types::Error> for ChainError {
    fn from(err: alloy::sol_types::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
