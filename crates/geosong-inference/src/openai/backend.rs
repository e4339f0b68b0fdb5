//! OpenAI-compatible structured chat backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use geosong_core::defaults::{
    ENV_OPENAI_API_KEY, ENV_OPENAI_BASE_URL, ENV_OPENAI_GEN_MODEL, ENV_OPENAI_TIMEOUT,
    LYRICS_MODEL, OPENAI_URL,
};
use geosong_core::{ChatMessage, Error, Result, StructuredChatBackend};

use super::error::{to_geosong_error, OpenAIErrorCode};
use super::types::*;
use crate::{env_opt, env_parse};

/// Default timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for generation.
    pub gen_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: OPENAI_URL.to_string(),
            api_key: None,
            gen_model: LYRICS_MODEL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OpenAIConfig {
    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: env_opt(ENV_OPENAI_BASE_URL).unwrap_or_else(|| OPENAI_URL.to_string()),
            api_key: env_opt(ENV_OPENAI_API_KEY),
            gen_model: env_opt(ENV_OPENAI_GEN_MODEL).unwrap_or_else(|| LYRICS_MODEL.to_string()),
            timeout_seconds: env_parse(ENV_OPENAI_TIMEOUT, DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// OpenAI-compatible chat backend with structured outputs.
pub struct OpenAIChatBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIChatBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Initializing OpenAI backend: url={}, gen={}",
            config.base_url, config.gen_model
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        req.header("Content-Type", "application/json")
    }
}

#[async_trait]
impl StructuredChatBackend for OpenAIChatBackend {
    #[instrument(skip(self, messages, schema), fields(subsystem = "inference", component = "openai", op = "complete_structured", model = %self.config.gen_model, message_count = messages.len()))]
    async fn complete_structured(
        &self,
        messages: &[ChatMessage],
        schema_name: &str,
        schema: &JsonValue,
        max_tokens: u32,
    ) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.config.gen_model.clone(),
            messages: messages.iter().map(WireMessage::from).collect(),
            max_tokens: Some(max_tokens),
            response_format: Some(ResponseFormat::json_schema(schema_name, schema)),
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ExternalService(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: OpenAIErrorResponse = response.json().await.unwrap_or(OpenAIErrorResponse {
                error: OpenAIError {
                    message: "Unknown error".to_string(),
                    error_type: "unknown".to_string(),
                    code: None,
                },
            });
            let code = OpenAIErrorCode::from_response(status.as_u16(), &body.error.error_type);
            return Err(to_geosong_error(
                code,
                &format!("OpenAI returned {}: {}", status, body.error.message),
            ));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::ExternalService(format!("Failed to parse response: {}", e)))?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::ExternalService("OpenAI returned no choices".to_string()))?;

        if let Some(refusal) = choice.message.refusal {
            warn!(refusal = %refusal, "Model refused structured completion");
            return Err(Error::ExternalService(format!("Model refused: {}", refusal)));
        }

        let content = choice.message.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(Error::ExternalService(
                "OpenAI returned empty content".to_string(),
            ));
        }

        debug!(
            response_len = content.len(),
            finish_reason = ?choice.finish_reason,
            "Structured completion complete"
        );
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}
