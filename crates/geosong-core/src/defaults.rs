//! Centralized default constants for geosong.
//!
//! Every crate reads its defaults from here instead of defining its own magic
//! numbers. Environment variable names live next to the values they override.

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 5000;

/// Maximum upload payload (16 MiB across all files).
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Default CORS origins when `ALLOWED_ORIGINS` is unset.
pub const ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

// =============================================================================
// MEDIA
// =============================================================================

/// File extensions accepted as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// File extensions accepted as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4"];

/// Longest edge of the JPEG preview embedded in the lyrics prompt.
pub const PREVIEW_MAX_DIMENSION: u32 = 1024;

/// Timestamp text used when an image carries no capture time.
pub const UNKNOWN_DATETIME: &str = "Unknown";

// =============================================================================
// POLLING
// =============================================================================

/// Fixed delay between status polls (video processing, audio generation).
pub const POLL_INTERVAL_SECS: u64 = 10;

/// Upper bound on polls before a wait is abandoned (360 x 10s = 1 hour).
pub const POLL_MAX_ATTEMPTS: u32 = 360;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Google Maps API base URL.
pub const GOOGLE_MAPS_URL: &str = "https://maps.googleapis.com";

/// Default Gemini API base URL.
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

/// Default vision model for video description.
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Timeout for a single structured video-description request.
pub const VISION_TIMEOUT_SECS: u64 = 600;

/// Default OpenAI-compatible API endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default lyrics model (must support `json_schema` response formats).
pub const LYRICS_MODEL: &str = "gpt-4o-2024-08-06";

/// Output-token ceiling for lyrics composition.
pub const LYRICS_MAX_TOKENS: u32 = 1000;

/// Timeout for generic capability HTTP requests in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// AUDIO
// =============================================================================

/// Default Suno-compatible API base URL.
pub const SUNO_URL: &str = "http://localhost:3001";

/// Default audio generation model.
pub const SUNO_MODEL: &str = "chirp-v3-5";

/// Status meaning the audio stream is playable (generation phase done).
pub const STATUS_STREAMING: &str = "streaming";

/// Status meaning the final artifact is downloadable.
pub const STATUS_COMPLETE: &str = "complete";

// =============================================================================
// SONG METADATA
// =============================================================================

/// Singer value that means "let the audio model choose".
pub const SINGER_RANDOM: &str = "random";

/// Singer reported back when the request named none.
pub const SINGER_DEFAULT_LABEL: &str = "Random";

/// Language name used when a code is missing or unrecognized.
pub const DEFAULT_LANGUAGE_NAME: &str = "English";

// =============================================================================
// ENVIRONMENT VARIABLE NAMES
// =============================================================================

pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";
pub const ENV_MAX_UPLOAD_BYTES: &str = "MAX_UPLOAD_BYTES";
pub const ENV_POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";
pub const ENV_POLL_MAX_ATTEMPTS: &str = "POLL_MAX_ATTEMPTS";

pub const ENV_GOOGLE_MAPS_API_KEY: &str = "GOOGLE_MAPS_API_KEY";
pub const ENV_GOOGLE_MAPS_BASE_URL: &str = "GOOGLE_MAPS_BASE_URL";

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const ENV_VISION_TIMEOUT_SECS: &str = "VISION_TIMEOUT_SECS";

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OPENAI_GEN_MODEL: &str = "OPENAI_GEN_MODEL";
pub const ENV_OPENAI_TIMEOUT: &str = "OPENAI_TIMEOUT";

pub const ENV_SUNO_API_BASE_URL: &str = "SUNO_API_BASE_URL";
pub const ENV_SUNO_MODEL: &str = "SUNO_MODEL";
