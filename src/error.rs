//! Error types shared by the fetch, decode and poll paths.

use thiserror::Error;

/// Why a single poll cycle failed.
///
/// Transport-class and decode-class failures are distinct variants, but the
/// poller treats every one of them the same way: the cycle failed and the
/// next tick retries.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Upstream returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("Invalid feed URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("Vehicle timestamp {0} is outside the representable range")]
    Timestamp(u64),
}

/// Coarse classification of a [`FeedError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedErrorKind {
    Transport,
    Decode,
}

impl FeedError {
    pub fn kind(&self) -> FeedErrorKind {
        match self {
            FeedError::Transport(_) | FeedError::Status(_) | FeedError::InvalidUrl { .. } => {
                FeedErrorKind::Transport
            }
            FeedError::Decode(_) | FeedError::Timestamp(_) => FeedErrorKind::Decode,
        }
    }
}
