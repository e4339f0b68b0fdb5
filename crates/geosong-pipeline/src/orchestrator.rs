//! End-to-end song pipeline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use geosong_core::defaults::{
    ENV_POLL_INTERVAL_SECS, ENV_POLL_MAX_ATTEMPTS, ENV_SUNO_MODEL, ENV_VISION_TIMEOUT_SECS,
    LYRICS_MAX_TOKENS, POLL_INTERVAL_SECS, POLL_MAX_ATTEMPTS, PREVIEW_MAX_DIMENSION,
    SINGER_DEFAULT_LABEL, SUNO_MODEL, VISION_TIMEOUT_SECS,
};
use geosong_core::{
    expand_language_code, merge_tags, AudioBackend, DownloadStatus, Error, MediaItem,
    RequestMetadata, Result, ReverseGeocoder, SongRequest, SongResult, StructuredChatBackend,
    VisionBackend,
};

use crate::composer::LyricsComposer;
use crate::describer::VideoDescriber;
use crate::geo::GeoResolver;
use crate::ingest::MediaIngestionPipeline;
use crate::poll::PollPolicy;
use crate::synthesizer::AudioSynthesizer;

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Tunables for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub poll: PollPolicy,
    pub vision_timeout: Duration,
    pub preview_max_dimension: u32,
    pub lyrics_max_tokens: u32,
    pub song_model: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            vision_timeout: Duration::from_secs(VISION_TIMEOUT_SECS),
            preview_max_dimension: PREVIEW_MAX_DIMENSION,
            lyrics_max_tokens: LYRICS_MAX_TOKENS,
            song_model: SUNO_MODEL.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Environment variables:
    /// - `POLL_INTERVAL_SECS`: delay between status polls (default: 10)
    /// - `POLL_MAX_ATTEMPTS`: polls before giving up (default: 360)
    /// - `VISION_TIMEOUT_SECS`: video description timeout (default: 600)
    /// - `SUNO_MODEL`: audio model (default: chirp-v3-5)
    pub fn from_env() -> Self {
        let song_model = std::env::var(ENV_SUNO_MODEL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| SUNO_MODEL.to_string());

        Self {
            poll: PollPolicy::new(
                Duration::from_secs(env_parse(ENV_POLL_INTERVAL_SECS, POLL_INTERVAL_SECS)),
                env_parse(ENV_POLL_MAX_ATTEMPTS, POLL_MAX_ATTEMPTS),
            ),
            vision_timeout: Duration::from_secs(env_parse(
                ENV_VISION_TIMEOUT_SECS,
                VISION_TIMEOUT_SECS,
            )),
            song_model,
            ..Self::default()
        }
    }
}

/// Media in, song out.
///
/// Holds no per-request state, so one instance serves every request.
#[derive(Clone)]
pub struct SongPipeline {
    ingestion: MediaIngestionPipeline,
    composer: LyricsComposer,
    synthesizer: AudioSynthesizer,
    song_model: String,
}

impl SongPipeline {
    pub fn new(
        geocoder: Arc<dyn ReverseGeocoder>,
        vision: Arc<dyn VisionBackend>,
        chat: Arc<dyn StructuredChatBackend>,
        audio: Arc<dyn AudioBackend>,
        config: PipelineConfig,
    ) -> Self {
        let describer =
            VideoDescriber::new(vision, config.poll).with_timeout(config.vision_timeout);
        let ingestion = MediaIngestionPipeline::new(GeoResolver::new(geocoder), describer)
            .with_preview_max_dimension(config.preview_max_dimension);

        Self {
            ingestion,
            composer: LyricsComposer::new(chat).with_max_tokens(config.lyrics_max_tokens),
            synthesizer: AudioSynthesizer::new(audio, config.poll),
            song_model: config.song_model,
        }
    }

    #[instrument(skip_all, fields(subsystem = "pipeline", component = "orchestrator", op = "run", item_count = items.len()))]
    pub async fn run(
        &self,
        items: &[MediaItem],
        metadata: &RequestMetadata,
        cancel: &CancellationToken,
    ) -> Result<SongResult> {
        let start = Instant::now();
        let outcome = self.run_stages(items, metadata, cancel).await;
        match &outcome {
            Ok(song) => info!(
                song_id = %song.id,
                duration_ms = start.elapsed().as_millis() as u64,
                "Song pipeline finished"
            ),
            Err(e) => error!(
                error = %e,
                duration_ms = start.elapsed().as_millis() as u64,
                "Song pipeline failed"
            ),
        }
        outcome
    }

    async fn run_stages(
        &self,
        items: &[MediaItem],
        metadata: &RequestMetadata,
        cancel: &CancellationToken,
    ) -> Result<SongResult> {
        let stage = Instant::now();
        let described = self.ingestion.ingest(items, cancel).await?;
        info!(
            item_count = described.len(),
            duration_ms = stage.elapsed().as_millis() as u64,
            "Stage ingest done"
        );

        let stage = Instant::now();
        let lyrics = self
            .composer
            .compose(
                &described,
                metadata.requested_tags(),
                metadata.language.as_deref(),
            )
            .await
            .ok_or_else(|| Error::LyricsGeneration("no lyrics were produced".to_string()))?;
        info!(
            duration_ms = stage.elapsed().as_millis() as u64,
            "Stage compose done"
        );

        let tags = merge_tags(&lyrics, metadata);
        let request = SongRequest {
            prompt: lyrics.lyrics.clone(),
            title: lyrics.title.clone(),
            tags,
            make_instrumental: false,
            model: self.song_model.clone(),
            wait_audio: false,
        };

        let stage = Instant::now();
        let record = self.synthesizer.generate(&request, cancel).await?;
        info!(
            song_id = %record.id,
            duration_ms = stage.elapsed().as_millis() as u64,
            "Stage synthesize done"
        );

        Ok(SongResult {
            id: record.id,
            title: lyrics.title,
            lyrics: lyrics.lyrics,
            genre_tags: lyrics.genre_tags,
            song_bpm: metadata.bpm.unwrap_or(lyrics.song_bpm),
            audio_url: record.audio_url,
            video_url: record.video_url,
            language: expand_language_code(metadata.language.as_deref()).to_string(),
            singer: metadata
                .singer
                .clone()
                .unwrap_or_else(|| SINGER_DEFAULT_LABEL.to_string()),
        })
    }

    /// Whether the final audio for `song_id` can be downloaded yet.
    pub async fn check_download(&self, song_id: &str) -> Result<DownloadStatus> {
        self.synthesizer.check_download(song_id).await
    }
}
