//! Suno-compatible song generation client.
//!
//! Talks to a self-hosted Suno API bridge exposing `POST /api/custom_generate`
//! and `GET /api/get?ids=..`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};

use geosong_core::defaults::{ENV_SUNO_API_BASE_URL, HTTP_TIMEOUT_SECS, SUNO_URL};
use geosong_core::{AudioBackend, Error, Result, SongRecord, SongRequest};

use crate::{env_opt, error_from_response};

/// Configuration for the Suno client.
#[derive(Debug, Clone)]
pub struct SunoConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for SunoConfig {
    fn default() -> Self {
        Self {
            base_url: SUNO_URL.to_string(),
            timeout_seconds: HTTP_TIMEOUT_SECS,
        }
    }
}

impl SunoConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_opt(ENV_SUNO_API_BASE_URL).unwrap_or_else(|| SUNO_URL.to_string()),
            ..Default::default()
        }
    }
}

/// Audio backend backed by a Suno API bridge.
pub struct SunoClient {
    client: Client,
    config: SunoConfig,
}

impl SunoClient {
    pub fn new(config: SunoConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!("Initializing Suno client: url={}", config.base_url);

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SunoConfig::from_env())
    }

    pub fn config(&self) -> &SunoConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }
}

#[async_trait]
impl AudioBackend for SunoClient {
    #[instrument(skip(self, request), fields(subsystem = "inference", component = "suno", op = "submit", model = %request.model, prompt_len = request.prompt.len()))]
    async fn submit(&self, request: &SongRequest) -> Result<Vec<SongRecord>> {
        let response = self
            .client
            .post(self.url("/api/custom_generate"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("Suno", response).await);
        }

        let records: Vec<SongRecord> = response.json().await?;
        debug!(record_count = records.len(), "Song submitted");
        Ok(records)
    }

    #[instrument(skip(self), fields(subsystem = "inference", component = "suno", op = "get"))]
    async fn get(&self, ids: &[String]) -> Result<Vec<SongRecord>> {
        let response = self
            .client
            .get(self.url("/api/get"))
            .query(&[("ids", ids.join(","))])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("Suno", response).await);
        }

        Ok(response.json().await?)
    }
}
