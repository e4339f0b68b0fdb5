//! Capability traits consumed by the song pipeline.
//!
//! Each remote service the pipeline talks to sits behind one of these traits so
//! the orchestration code can be driven by real HTTP clients in production and
//! by in-memory fakes in tests.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::{SongRecord, SongRequest};

// =============================================================================
// REVERSE GEOCODING
// =============================================================================

/// One component of a geocoded address ("Paris", "Île-de-France", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// A single reverse-geocoding candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

/// Resolves coordinates to address candidates, best match first.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Vec<GeocodeResult>>;
}

// =============================================================================
// VISION
// =============================================================================

/// Processing state of a file uploaded to the vision service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Processing,
    Active,
    Failed,
    Unspecified,
}

impl FileState {
    /// Parse the service's state string (`PROCESSING`, `ACTIVE`, ...).
    pub fn from_api(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "PROCESSING" => FileState::Processing,
            "ACTIVE" => FileState::Active,
            "FAILED" => FileState::Failed,
            _ => FileState::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileState::Processing => "PROCESSING",
            FileState::Active => "ACTIVE",
            FileState::Failed => "FAILED",
            FileState::Unspecified => "STATE_UNSPECIFIED",
        }
    }
}

impl std::fmt::Display for FileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a file held by the vision service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Resource name used for status checks and deletion (`files/abc123`).
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub state: FileState,
}

/// Remote multimodal model that accepts uploaded media.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Upload a local file.
    async fn upload_file(&self, path: &Path, mime_type: &str) -> Result<RemoteFile>;

    /// Fetch the current state of an uploaded file.
    async fn get_file(&self, name: &str) -> Result<RemoteFile>;

    /// Ask the model about a file, constrained to a JSON schema. Returns the
    /// raw JSON text.
    async fn generate_structured(
        &self,
        file: &RemoteFile,
        prompt: &str,
        schema: &JsonValue,
        timeout: Duration,
    ) -> Result<String>;

    /// Release an uploaded file.
    async fn delete_file(&self, name: &str) -> Result<()>;

    /// Model name for logging.
    fn model_name(&self) -> &str;
}

// =============================================================================
// LANGUAGE MODEL
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One part of a multimodal chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    /// An image reference; may be a `data:` URL.
    ImageUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: vec![ContentPart::Text(text.into())],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: vec![ContentPart::Text(text.into())],
        }
    }

    pub fn user_parts(content: Vec<ContentPart>) -> Self {
        Self {
            role: ChatRole::User,
            content,
        }
    }
}

/// Chat completion constrained to a JSON schema.
#[async_trait]
pub trait StructuredChatBackend: Send + Sync {
    /// Run a completion whose output must match `schema`. Returns the raw JSON
    /// text of the first choice.
    async fn complete_structured(
        &self,
        messages: &[ChatMessage],
        schema_name: &str,
        schema: &JsonValue,
        max_tokens: u32,
    ) -> Result<String>;

    /// Model name for logging.
    fn model_name(&self) -> &str;
}

// =============================================================================
// AUDIO
// =============================================================================

/// Asynchronous song generation service.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Submit a generation request; the service answers with one or more
    /// pending records.
    async fn submit(&self, request: &SongRequest) -> Result<Vec<SongRecord>>;

    /// Look up records by id.
    async fn get(&self, ids: &[String]) -> Result<Vec<SongRecord>>;
}
