//! `GET /download`: has the final audio been rendered yet?

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use geosong_core::DownloadStatus;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl From<DownloadStatus> for DownloadResponse {
    fn from(status: DownloadStatus) -> Self {
        match status {
            DownloadStatus::NotReady => Self {
                ready: false,
                audio_url: None,
            },
            DownloadStatus::Ready { audio_url } => Self {
                ready: true,
                audio_url: Some(audio_url),
            },
        }
    }
}

/// Single non-blocking readiness check for a song id.
#[instrument(skip_all, fields(subsystem = "api", component = "download", op = "check_download"))]
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing id parameter".to_string()))?;

    let status = state.pipeline.check_download(id.trim()).await?;
    Ok(Json(status.into()))
}
