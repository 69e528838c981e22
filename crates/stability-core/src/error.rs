//! Error types for the Stability client

use thiserror::Error;

/// Result type alias using the crate's [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the Stability client
#[derive(Error, Debug)]
pub enum Error {
    /// A request failed local validation and was never sent to the network.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// No API key was provided.
    #[error("API key missing. Set STABILITY_API_KEY or pass a key to the builder.")]
    ApiKeyMissing,

    /// Transport-level failure, surfaced from the HTTP client unchanged.
    #[error("Network error: {0}. Check your internet connection.")]
    Network(#[from] reqwest::Error),

    /// The API answered with a status code of 400 or above.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code of the failing response
        status: u16,
        /// Human-readable message, normalized from the error body
        message: String,
        /// Server-assigned error identifier, when the structured shape was returned
        id: Option<String>,
        /// Short machine-readable error name, when the structured shape was returned
        name: Option<String>,
    },

    /// A successful response whose body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The poll deadline elapsed while a generation was still in progress.
    #[error("Timed out after {waited_secs}s waiting for generation '{id}'")]
    PollTimeout {
        /// Identifier of the job that was being polled
        id: String,
        /// Seconds spent polling before giving up
        waited_secs: u64,
    },
}

impl Error {
    /// HTTP status code, for errors that carry one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the error was raised before any network I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::ApiKeyMissing)
    }
}
