//! `POST /upload`: media in, song out.

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::Json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use geosong_core::{
    classify_media, sanitize_filename, Error, MediaItem, RequestMetadata, SongResult,
};

use crate::{ApiError, AppState};

const FIELD_IMAGES: &str = "images";
const FIELD_METADATA: &str = "metadata";

/// Generate a song from uploaded photos and videos.
///
/// # Form fields
/// - `images`: one or more `.jpg`/`.jpeg`/`.mp4` files (repeatable)
/// - `metadata`: optional JSON `{tags, language, singer, bpm}`
///
/// # Returns
/// - 200 OK with the song
/// - 400 Bad Request when nothing usable was uploaded or metadata is invalid
/// - 500 when description or lyrics generation fails
/// - 502 when a remote service fails, 504 when waiting on it gives up
#[instrument(skip_all, fields(subsystem = "api", component = "upload", op = "upload"))]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SongResult>, ApiError> {
    let start = Instant::now();

    // Deleted with everything in it when the handler returns or is dropped.
    let workdir = tempfile::tempdir()
        .map_err(|e| ApiError::Internal(format!("Failed to create upload directory: {}", e)))?;

    let mut saw_images_field = false;
    let mut named_files = 0usize;
    let mut items: Vec<MediaItem> = Vec::new();
    let mut metadata_raw: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FIELD_IMAGES) => {
                saw_images_field = true;
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {}", e)))?;

                if filename.trim().is_empty() {
                    continue;
                }
                named_files += 1;

                let Some(kind) = classify_media(&filename, &data) else {
                    warn!(filename = %filename, "Rejected upload with unsupported type");
                    continue;
                };

                // Index prefix keeps two uploads with the same name apart.
                let stored = format!("{:03}_{}", items.len(), sanitize_filename(&filename));
                let path = workdir.path().join(stored);
                tokio::fs::write(&path, &data)
                    .await
                    .map_err(|e| ApiError::Internal(format!("Failed to store upload: {}", e)))?;
                debug!(media_path = %path.display(), media_kind = %kind, bytes = data.len(), "Stored upload");
                items.push(MediaItem::new(path, kind));
            }
            Some(FIELD_METADATA) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read metadata: {}", e)))?;
                metadata_raw = Some(text);
            }
            other => debug!(field = ?other, "Ignoring unknown form field"),
        }
    }

    if !saw_images_field {
        return Err(Error::Validation("No images provided".to_string()).into());
    }
    if named_files == 0 {
        return Err(Error::Validation("No selected files".to_string()).into());
    }
    if items.is_empty() {
        return Err(Error::Validation("No valid data found".to_string()).into());
    }

    let metadata = RequestMetadata::from_json(metadata_raw.as_deref().unwrap_or_default())?;
    info!(item_count = items.len(), "Upload accepted");

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let song = state.pipeline.run(&items, &metadata, &cancel).await?;

    info!(
        song_id = %song.id,
        duration_ms = start.elapsed().as_millis() as u64,
        "Upload handled"
    );
    drop(workdir);
    Ok(Json(song))
}
