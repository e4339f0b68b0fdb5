//! Gemini vision backend.
//!
//! Videos go through the Files API (resumable upload, then status polling by
//! the caller), and descriptions come from `generateContent` with a response
//! schema so the model answers in JSON.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, instrument, trace};

use geosong_core::defaults::{
    ENV_GEMINI_API_KEY, ENV_GEMINI_BASE_URL, ENV_GEMINI_MODEL, GEMINI_MODEL, GEMINI_URL,
    HTTP_TIMEOUT_SECS,
};
use geosong_core::{Error, FileState, RemoteFile, Result, VisionBackend};

use crate::{env_opt, env_required, error_from_response};

const API_VERSION: &str = "v1beta";

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Timeout for upload/status/delete calls. Generation uses the caller's
    /// timeout instead.
    pub timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: GEMINI_URL.to_string(),
            api_key: String::new(),
            model: GEMINI_MODEL.to_string(),
            timeout_seconds: HTTP_TIMEOUT_SECS,
        }
    }
}

impl GeminiConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env_opt(ENV_GEMINI_BASE_URL).unwrap_or_else(|| GEMINI_URL.to_string()),
            api_key: env_required(ENV_GEMINI_API_KEY)?,
            model: env_opt(ENV_GEMINI_MODEL).unwrap_or_else(|| GEMINI_MODEL.to_string()),
            ..Default::default()
        })
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    state: Option<String>,
}

impl From<FileResource> for RemoteFile {
    fn from(f: FileResource) -> Self {
        RemoteFile {
            state: f
                .state
                .as_deref()
                .map(FileState::from_api)
                .unwrap_or(FileState::Unspecified),
            name: f.name,
            uri: f.uri,
            mime_type: f.mime_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    FileData {
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(rename = "fileUri")]
        file_uri: String,
    },
    Text(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: JsonValue,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Rewrite a JSON Schema into the OpenAPI subset Gemini accepts: upper-case
/// type names and no `additionalProperties`.
pub fn to_gemini_schema(schema: &JsonValue) -> JsonValue {
    match schema {
        JsonValue::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                match key.as_str() {
                    "additionalProperties" | "$schema" => {}
                    "type" => {
                        let ty = value
                            .as_str()
                            .map(|s| JsonValue::String(s.to_ascii_uppercase()))
                            .unwrap_or_else(|| value.clone());
                        out.insert(key.clone(), ty);
                    }
                    _ => {
                        out.insert(key.clone(), to_gemini_schema(value));
                    }
                }
            }
            JsonValue::Object(out)
        }
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}

// =============================================================================
// BACKEND
// =============================================================================

/// Vision backend backed by the Gemini API.
pub struct GeminiVisionBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiVisionBackend {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Initializing Gemini vision backend: url={}, model={}",
            config.base_url, config.model
        );

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds)
    }
}

#[async_trait]
impl VisionBackend for GeminiVisionBackend {
    #[instrument(skip(self), fields(subsystem = "inference", component = "gemini", op = "upload_file", media_path = %path.display()))]
    async fn upload_file(&self, path: &Path, mime_type: &str) -> Result<RemoteFile> {
        let data = tokio::fs::read(path).await?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        trace!(bytes = data.len(), "Starting resumable upload");

        let start = self
            .client
            .post(format!("{}/upload/{}/files", self.base(), API_VERSION))
            .query(&[("key", self.config.api_key.as_str())])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", data.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .timeout(self.request_timeout())
            .send()
            .await?;

        if !start.status().is_success() {
            return Err(error_from_response("Gemini upload", start).await);
        }

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::ExternalService("Gemini upload did not return an upload URL".to_string())
            })?;

        let finish = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(data)
            .timeout(self.request_timeout())
            .send()
            .await?;

        if !finish.status().is_success() {
            return Err(error_from_response("Gemini upload", finish).await);
        }

        let uploaded: UploadResponse = finish.json().await?;
        let file = RemoteFile::from(uploaded.file);
        debug!(remote_file = %file.name, state = %file.state, "Upload complete");
        Ok(file)
    }

    #[instrument(skip(self), fields(subsystem = "inference", component = "gemini", op = "get_file"))]
    async fn get_file(&self, name: &str) -> Result<RemoteFile> {
        let response = self
            .client
            .get(format!("{}/{}/{}", self.base(), API_VERSION, name))
            .query(&[("key", self.config.api_key.as_str())])
            .timeout(self.request_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("Gemini files", response).await);
        }

        let file: FileResource = response.json().await?;
        Ok(file.into())
    }

    #[instrument(skip(self, file, prompt, schema), fields(subsystem = "inference", component = "gemini", op = "generate_structured", model = %self.config.model, remote_file = %file.name, prompt_len = prompt.len()))]
    async fn generate_structured(
        &self,
        file: &RemoteFile,
        prompt: &str,
        schema: &JsonValue,
        timeout: Duration,
    ) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::FileData {
                        mime_type: file.mime_type.clone(),
                        file_uri: file.uri.clone(),
                    },
                    Part::Text(prompt.to_string()),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: to_gemini_schema(schema),
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/{}/models/{}:generateContent",
                self.base(),
                API_VERSION,
                self.config.model
            ))
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .timeout(timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("Gemini generateContent", response).await);
        }

        let body: GenerateResponse = response.json().await?;
        let candidate = body.candidates.into_iter().next().ok_or_else(|| {
            Error::ExternalService("Gemini returned no candidates".to_string())
        })?;
        let finish_reason = candidate.finish_reason.unwrap_or_default();

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        debug!(response_len = text.len(), finish_reason = %finish_reason, "Generation complete");
        Ok(text)
    }

    #[instrument(skip(self), fields(subsystem = "inference", component = "gemini", op = "delete_file"))]
    async fn delete_file(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/{}/{}", self.base(), API_VERSION, name))
            .query(&[("key", self.config.api_key.as_str())])
            .timeout(self.request_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("Gemini files", response).await);
        }
        Ok(())
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
