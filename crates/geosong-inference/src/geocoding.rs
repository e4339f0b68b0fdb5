//! Google Maps reverse geocoding client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use geosong_core::defaults::{
    ENV_GOOGLE_MAPS_API_KEY, ENV_GOOGLE_MAPS_BASE_URL, GOOGLE_MAPS_URL, HTTP_TIMEOUT_SECS,
};
use geosong_core::{Error, GeocodeResult, Result, ReverseGeocoder};

use crate::{env_opt, env_required, error_from_response};

/// Configuration for the Google Maps client.
#[derive(Debug, Clone)]
pub struct GoogleMapsConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

impl Default for GoogleMapsConfig {
    fn default() -> Self {
        Self {
            base_url: GOOGLE_MAPS_URL.to_string(),
            api_key: String::new(),
            timeout_seconds: HTTP_TIMEOUT_SECS,
        }
    }
}

impl GoogleMapsConfig {
    /// Load from `GOOGLE_MAPS_API_KEY` / `GOOGLE_MAPS_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env_opt(ENV_GOOGLE_MAPS_BASE_URL)
                .unwrap_or_else(|| GOOGLE_MAPS_URL.to_string()),
            api_key: env_required(ENV_GOOGLE_MAPS_API_KEY)?,
            ..Default::default()
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

/// Reverse geocoder backed by the Google Maps Geocoding API.
pub struct GoogleMapsGeocoder {
    client: Client,
    config: GoogleMapsConfig,
}

impl GoogleMapsGeocoder {
    pub fn new(config: GoogleMapsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!("Initializing Google Maps geocoder: url={}", config.base_url);

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(GoogleMapsConfig::from_env()?)
    }

    pub fn config(&self) -> &GoogleMapsConfig {
        &self.config
    }
}

#[async_trait]
impl ReverseGeocoder for GoogleMapsGeocoder {
    #[instrument(skip(self), fields(subsystem = "inference", component = "google_maps", op = "reverse_geocode"))]
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Vec<GeocodeResult>> {
        let url = format!(
            "{}/maps/api/geocode/json",
            self.config.base_url.trim_end_matches('/')
        );
        let latlng = format!("{},{}", latitude, longitude);

        let response = self
            .client
            .get(&url)
            .query(&[("latlng", latlng.as_str()), ("key", self.config.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("Google Maps", response).await);
        }

        let body: GeocodeResponse = response.json().await?;
        match body.status.as_str() {
            "OK" => {
                debug!(result_count = body.results.len(), "Reverse geocode complete");
                Ok(body.results)
            }
            "ZERO_RESULTS" => {
                debug!("Reverse geocode returned no results");
                Ok(Vec::new())
            }
            other => Err(Error::ExternalService(format!(
                "Google Maps status {}: {}",
                other,
                body.error_message.unwrap_or_default()
            ))),
        }
    }
}
