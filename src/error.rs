#![forbid(unsafe_code)]

//! Error taxonomy shared by every collection stage.
//!
//! Everything in [`CollectorError`] is fatal for a run. Per-video transcript
//! failures use [`crate::transcript::TranscriptUnavailable`] instead and never
//! leave the orchestrator loop.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    /// A required setting is missing or could not be parsed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The channel (or its uploads playlist) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-success response or transport failure from the Data API.
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The transcript client could not be constructed.
    #[error("transcript client unavailable: {0}")]
    TranscriptClient(String),
}

impl CollectorError {
    pub(crate) fn transport(endpoint: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.to_owned(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = CollectorError> = std::result::Result<T, E>;
