//! Server configuration from the environment.

use axum::http::HeaderValue;

use geosong_core::defaults::{
    ALLOWED_ORIGINS, ENV_ALLOWED_ORIGINS, ENV_HOST, ENV_MAX_UPLOAD_BYTES, ENV_PORT,
    MAX_UPLOAD_BYTES, SERVER_HOST, SERVER_PORT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Comma-separated CORS origin allow-list.
    pub allowed_origins: String,
    /// Limit on the whole request body, all files together.
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: SERVER_HOST.to_string(),
            port: SERVER_PORT,
            allowed_origins: ALLOWED_ORIGINS.to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl AppConfig {
    /// Environment variables:
    /// - `HOST` (default: 0.0.0.0)
    /// - `PORT` (default: 5000)
    /// - `ALLOWED_ORIGINS` (default: local dev frontends)
    /// - `MAX_UPLOAD_BYTES` (default: 16 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            host: var(ENV_HOST).unwrap_or(defaults.host),
            port: var(ENV_PORT)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            allowed_origins: var(ENV_ALLOWED_ORIGINS).unwrap_or(defaults.allowed_origins),
            max_upload_bytes: var(ENV_MAX_UPLOAD_BYTES)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a comma-separated origin list, dropping entries that are not valid
/// header values. Falls back to the default origins when nothing is left.
pub fn parse_allowed_origins(origins: &str) -> Vec<HeaderValue> {
    let parse = |list: &str| -> Vec<HeaderValue> {
        list.split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                match trimmed.parse::<HeaderValue>() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                        None
                    }
                }
            })
            .collect()
    };

    let parsed = parse(origins);
    if parsed.is_empty() {
        parse(ALLOWED_ORIGINS)
    } else {
        parsed
    }
}
