//! Video description through the vision capability.
//!
//! Per video: upload, wait while the service reports `PROCESSING`, then ask for
//! a structured description. The uploaded copy is deleted afterwards whatever
//! the outcome. Any failure here aborts the whole request.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value as JsonValue};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use geosong_core::defaults::VISION_TIMEOUT_SECS;
use geosong_core::{
    mime_type_for, DescribedMedia, Error, FileState, MediaKind, RemoteFile, Result,
    VideoDescription, VisionBackend,
};

use crate::poll::{poll_until, PollPolicy, PollStatus};

/// Instruction sent with every video.
pub const VIDEO_PROMPT: &str = "Generate a description of the video, its mood and where the video takes place to your best guess.";

/// Output schema for [`VideoDescription`].
pub fn video_description_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": {
            "location": {"type": "string"},
            "video_description": {"type": "string"},
            "mood_of_video": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["location", "video_description", "mood_of_video"]
    })
}

/// Parse the model's JSON answer into a described video.
pub fn parse_video_description(raw: &str) -> Result<DescribedMedia> {
    let described: VideoDescription = serde_json::from_str(raw.trim())
        .map_err(|e| Error::DescriptionFailed(format!("Malformed video description: {}", e)))?;
    DescribedMedia::video(described).ok_or_else(|| {
        Error::DescriptionFailed("Video description has neither location nor text".to_string())
    })
}

/// Drives one video through upload, processing, and structured generation.
#[derive(Clone)]
pub struct VideoDescriber {
    vision: Arc<dyn VisionBackend>,
    poll: PollPolicy,
    timeout: Duration,
}

impl VideoDescriber {
    pub fn new(vision: Arc<dyn VisionBackend>, poll: PollPolicy) -> Self {
        Self {
            vision,
            poll,
            timeout: Duration::from_secs(VISION_TIMEOUT_SECS),
        }
    }

    /// Override the structured generation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[instrument(skip(self, cancel), fields(subsystem = "pipeline", component = "describer", op = "describe", media_path = %path.display()))]
    pub async fn describe(&self, path: &Path, cancel: &CancellationToken) -> Result<DescribedMedia> {
        let start = Instant::now();
        let uploaded = self
            .vision
            .upload_file(path, mime_type_for(MediaKind::Video))
            .await?;
        debug!(remote_file = %uploaded.name, state = %uploaded.state, "Video uploaded");

        let outcome = self.describe_uploaded(uploaded.clone(), cancel).await;

        if let Err(e) = self.vision.delete_file(&uploaded.name).await {
            warn!(remote_file = %uploaded.name, error = %e, "Failed to delete uploaded video");
        }

        if outcome.is_ok() {
            info!(
                remote_file = %uploaded.name,
                duration_ms = start.elapsed().as_millis() as u64,
                "Video described"
            );
        }
        outcome
    }

    async fn describe_uploaded(
        &self,
        uploaded: RemoteFile,
        cancel: &CancellationToken,
    ) -> Result<DescribedMedia> {
        let active = self.wait_until_processed(uploaded, cancel).await?;

        let raw = self
            .vision
            .generate_structured(
                &active,
                VIDEO_PROMPT,
                &video_description_schema(),
                self.timeout,
            )
            .await?;

        parse_video_description(&raw)
    }

    async fn wait_until_processed(
        &self,
        uploaded: RemoteFile,
        cancel: &CancellationToken,
    ) -> Result<RemoteFile> {
        let vision = self.vision.as_ref();
        let name = uploaded.name.clone();
        let what = format!("video {}", name);
        let mut first = Some(uploaded);

        poll_until(&self.poll, cancel, &what, |_| {
            let known = first.take();
            let name = name.clone();
            async move {
                let file = match known {
                    Some(file) => file,
                    None => vision.get_file(&name).await?,
                };
                match file.state {
                    FileState::Processing => Ok(PollStatus::Pending(file.state.to_string())),
                    FileState::Failed => Err(Error::DescriptionFailed(file.state.to_string())),
                    FileState::Active | FileState::Unspecified => Ok(PollStatus::Ready(file)),
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_description() {
        let raw = r#"{"location":"Lyon, France","video_description":"A river at dusk","mood_of_video":["calm","warm"]}"#;
        let item = parse_video_description(raw).unwrap();
        assert_eq!(item.source_kind, MediaKind::Video);
        assert_eq!(item.location_text, "Lyon, France");
        assert_eq!(item.time_or_mood_context, "calm, warm");
    }

    #[test]
    fn test_parse_malformed_is_description_failed() {
        let err = parse_video_description("{not json").unwrap_err();
        assert!(matches!(err, Error::DescriptionFailed(_)));

        let err = parse_video_description(r#"{"location":"x"}"#).unwrap_err();
        assert!(matches!(err, Error::DescriptionFailed(_)));
    }

    #[test]
    fn test_parse_empty_is_description_failed() {
        let raw = r#"{"location":"","video_description":"","mood_of_video":[]}"#;
        assert!(matches!(
            parse_video_description(raw),
            Err(Error::DescriptionFailed(_))
        ));
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = video_description_schema();
        assert_eq!(schema["required"].as_array().unwrap().len(), 3);
    }
}
