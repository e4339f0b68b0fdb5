//! # geosong-inference
//!
//! HTTP clients for the remote capabilities geosong depends on.
//!
//! This crate provides:
//! - Google Maps reverse geocoding ([`GoogleMapsGeocoder`])
//! - Gemini file upload + structured generation for video ([`GeminiVisionBackend`])
//! - OpenAI-compatible structured chat completions for lyrics ([`openai::OpenAIChatBackend`])
//! - Suno-compatible song generation ([`SunoClient`])
//!
//! Every client implements one of the capability traits from `geosong-core`
//! and is configured from the environment via `from_env()`.
//!
//! # Example
//!
//! ```rust,no_run
//! use geosong_core::ReverseGeocoder;
//! use geosong_inference::GoogleMapsGeocoder;
//!
//! #[tokio::main]
//! async fn main() {
//!     let geocoder = GoogleMapsGeocoder::from_env().unwrap();
//!     let results = geocoder.reverse_geocode(48.8584, 2.2945).await.unwrap();
//!     println!("{} candidates", results.len());
//! }
//! ```

pub mod gemini;
pub mod geocoding;
pub mod openai;
pub mod suno;

pub use gemini::{GeminiConfig, GeminiVisionBackend};
pub use geocoding::{GoogleMapsConfig, GoogleMapsGeocoder};
pub use openai::{OpenAIChatBackend, OpenAIConfig};
pub use suno::{SunoClient, SunoConfig};

use geosong_core::{Error, Result};

/// Read an env var, treating empty values as unset.
pub(crate) fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read a required env var.
pub(crate) fn env_required(name: &str) -> Result<String> {
    env_opt(name).ok_or_else(|| Error::Config(format!("{} is not set", name)))
}

/// Read and parse an env var, falling back to `default` when unset or invalid.
pub(crate) fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env_opt(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Turn a non-success response into an `ExternalService` error.
pub(crate) async fn error_from_response(service: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::ExternalService(format!("{} returned {}: {}", service, status, body))
}
