//! HTTP handlers for geosong-api.

pub mod download;
pub mod upload;

use axum::response::IntoResponse;
use axum::Json;

pub use download::{download, DownloadResponse};
pub use upload::upload;

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
