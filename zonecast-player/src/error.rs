//! Error types for zonecast-player
//!
//! Every failure the controller can surface falls into one of the categories
//! below. None of them is fatal to a running session: validation errors leave
//! state untouched, playback and remote errors are reported and the session
//! continues.

use thiserror::Error;

/// Main error type for zonecast-player
#[derive(Error, Debug)]
pub enum Error {
    /// Start preconditions unmet (no music selected, no zone selected)
    #[error("{0}")]
    Validation(String),

    /// Announcement unplayable or its audio failed
    #[error("Playback error: {0}")]
    Playback(String),

    /// Backend playback API rejected a request or was unreachable
    #[error("Remote API error: {0}")]
    RemoteApi(String),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Controller task is no longer running
    #[error("Playback controller unavailable")]
    ControllerUnavailable,
}

impl From<zonecast_common::Error> for Error {
    fn from(e: zonecast_common::Error) -> Self {
        match e {
            zonecast_common::Error::Io(io) => Error::Io(io),
            zonecast_common::Error::Config(msg) => Error::Config(msg),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::RemoteApi(e.to_string())
    }
}

/// Convenience Result type using zonecast-player Error
pub type Result<T> = std::result::Result<T, Error>;
