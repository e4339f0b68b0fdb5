//! Error types for geosong.

use thiserror::Error;

/// Result type alias using geosong's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for geosong operations.
///
/// Variants map one-to-one onto the request-level failure taxonomy; per-item
/// conditions (missing EXIF, failed geocode) never surface as an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    /// No files supplied, or none passed the upload allow-list, or the
    /// request metadata has the wrong shape.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Ingestion produced zero described media items.
    #[error("No valid data found")]
    NoUsableMedia,

    /// A video failed remote processing or produced malformed structured output.
    #[error("Description failed: {0}")]
    DescriptionFailed(String),

    /// The language model failed or returned nothing usable.
    #[error("Failed to generate lyrics: {0}")]
    LyricsGeneration(String),

    /// Transport-level failure from a remote capability (maps, vision, audio).
    #[error("External service error: {0}")]
    ExternalService(String),

    /// A bounded poll loop ran out of attempts before reaching its target state.
    #[error("Gave up waiting for {what} after {attempts} polls (last status: {last_status})")]
    PollExhausted {
        what: String,
        attempts: u32,
        last_status: String,
    },

    /// The caller cancelled an in-flight wait.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::ExternalService(e.to_string())
    }
}
