//! Error types for snapshot-core

use thiserror::Error;

/// Errors that can occur while talking to Copr or evaluating build states
#[derive(Error, Debug)]
pub enum CoprError {
    /// Transport-level failure (connection refused, TLS, timeout, ...)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Copr answered with a non-success status code
    #[error("Copr API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Copr has no such object (project, build, ...)
    #[error("No result from Copr: {0}")]
    NoResult(String),

    /// The response body did not match the expected schema
    #[error("Failed to decode Copr response: {0}")]
    Decode(String),

    /// A build status outside the known set
    #[error("Unknown Copr build status: {status:?}")]
    UnknownStatus { status: String },

    /// Malformed chroot filter pattern
    #[error("Invalid chroot pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Missing or unreadable Copr credentials
    #[error("Copr configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for CoprError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CoprError::Decode(err.to_string())
        } else {
            CoprError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CoprError {
    fn from(err: serde_json::Error) -> Self {
        CoprError::Decode(err.to_string())
    }
}

impl CoprError {
    /// True for the "object does not exist" answer from Copr.
    pub fn is_no_result(&self) -> bool {
        matches!(self, CoprError::NoResult(_))
    }
}

/// Result type for snapshot-core operations
pub type Result<T> = std::result::Result<T, CoprError>;
