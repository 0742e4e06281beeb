//! Error types for the relay

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Relay at capacity ({0} sessions)")]
    AtCapacity(usize),

    #[error("Serialization error: {0}")]
    Serialization(#[from] birdsong_core::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;
