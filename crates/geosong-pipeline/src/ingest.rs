//! Turn uploaded media into described items.

use std::path::PathBuf;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use geosong_core::defaults::{PREVIEW_MAX_DIMENSION, UNKNOWN_DATETIME};
use geosong_core::{extract_capture_metadata, DescribedMedia, Error, MediaItem, MediaKind, Result};

use crate::describer::VideoDescriber;
use crate::geo::GeoResolver;
use crate::preview::encode_preview_file;

/// Images are resolved through EXIF GPS + reverse geocoding and silently
/// skipped when that fails. Videos go through the vision capability and abort
/// the request when that fails.
#[derive(Clone)]
pub struct MediaIngestionPipeline {
    resolver: GeoResolver,
    describer: VideoDescriber,
    preview_max_dimension: u32,
}

impl MediaIngestionPipeline {
    pub fn new(resolver: GeoResolver, describer: VideoDescriber) -> Self {
        Self {
            resolver,
            describer,
            preview_max_dimension: PREVIEW_MAX_DIMENSION,
        }
    }

    pub fn with_preview_max_dimension(mut self, max_dimension: u32) -> Self {
        self.preview_max_dimension = max_dimension;
        self
    }

    /// Described images (in upload order) followed by described videos (in
    /// upload order). Fails with [`Error::NoUsableMedia`] when nothing survives.
    #[instrument(skip(self, items, cancel), fields(subsystem = "pipeline", component = "ingest", op = "ingest", item_count = items.len()))]
    pub async fn ingest(
        &self,
        items: &[MediaItem],
        cancel: &CancellationToken,
    ) -> Result<Vec<DescribedMedia>> {
        let start = Instant::now();
        let mut described = Vec::with_capacity(items.len());

        for item in items.iter().filter(|i| i.kind == MediaKind::Image) {
            if let Some(image) = self.describe_image(item.path.clone()).await? {
                described.push(image);
            }
        }
        let image_count = described.len();

        for item in items.iter().filter(|i| i.kind == MediaKind::Video) {
            described.push(self.describer.describe(&item.path, cancel).await?);
        }

        info!(
            images = image_count,
            videos = described.len() - image_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Media ingestion complete"
        );

        if described.is_empty() {
            return Err(Error::NoUsableMedia);
        }
        Ok(described)
    }

    /// `Ok(None)` when the image has to be skipped.
    async fn describe_image(&self, path: PathBuf) -> Result<Option<DescribedMedia>> {
        let exif_path = path.clone();
        let metadata = tokio::task::spawn_blocking(move || extract_capture_metadata(&exif_path))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        let Some(geotag) = metadata.geotag else {
            debug!(media_path = %path.display(), "No GPS metadata, skipping image");
            return Ok(None);
        };

        let Some(location) = self.resolver.resolve(geotag.latitude, geotag.longitude).await else {
            debug!(media_path = %path.display(), "No resolvable location, skipping image");
            return Ok(None);
        };

        let max_dimension = self.preview_max_dimension;
        let preview_path = path.clone();
        let preview =
            tokio::task::spawn_blocking(move || encode_preview_file(&preview_path, max_dimension))
                .await
                .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        let preview = match preview {
            Ok(b64) => b64,
            Err(e) => {
                warn!(media_path = %path.display(), error = %e, "Could not build preview, skipping image");
                return Ok(None);
            }
        };

        if let Some(model) = metadata.camera_model.as_deref() {
            debug!(media_path = %path.display(), camera_model = model, "Image camera");
        }

        let datetime = metadata
            .datetime
            .unwrap_or_else(|| UNKNOWN_DATETIME.to_string());
        Ok(DescribedMedia::image(location, datetime, preview))
    }
}
