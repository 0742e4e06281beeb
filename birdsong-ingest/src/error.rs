//! Ingest error types

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Stream rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl IngestError {
    /// Errors that end a subscription
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Rejected { .. })
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<LinesCodecError> for IngestError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::Io(e) => Self::Transport(e.to_string()),
            LinesCodecError::MaxLineLengthExceeded => {
                Self::Transport("stream line exceeded maximum length".to_string())
            }
        }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedEvent(err.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderValue> for IngestError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
