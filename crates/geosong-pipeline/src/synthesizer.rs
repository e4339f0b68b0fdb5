//! Audio generation: submit, then wait for the stream to come up.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use geosong_core::defaults::{STATUS_COMPLETE, STATUS_STREAMING};
use geosong_core::{AudioBackend, DownloadStatus, Error, Result, SongRecord, SongRequest};

use crate::poll::{poll_until, PollPolicy, PollStatus};

const STATUS_ERROR: &str = "error";

/// Classify one observation of a record during the generation phase.
fn generation_status(record: Option<SongRecord>) -> Result<PollStatus<SongRecord>> {
    let Some(record) = record else {
        return Ok(PollStatus::Pending("missing".to_string()));
    };
    match record.status.as_str() {
        STATUS_STREAMING | STATUS_COMPLETE => Ok(PollStatus::Ready(record)),
        STATUS_ERROR => Err(Error::ExternalService(format!(
            "Song {} failed to generate",
            record.id
        ))),
        _ => Ok(PollStatus::Pending(record.status)),
    }
}

#[derive(Clone)]
pub struct AudioSynthesizer {
    audio: Arc<dyn AudioBackend>,
    poll: PollPolicy,
}

impl AudioSynthesizer {
    pub fn new(audio: Arc<dyn AudioBackend>, poll: PollPolicy) -> Self {
        Self { audio, poll }
    }

    /// Submit `request` and return the first record once it is streaming.
    #[instrument(skip(self, request, cancel), fields(subsystem = "pipeline", component = "synthesizer", op = "generate", model = %request.model))]
    pub async fn generate(
        &self,
        request: &SongRequest,
        cancel: &CancellationToken,
    ) -> Result<SongRecord> {
        let start = Instant::now();
        let submitted = self.audio.submit(request).await?;
        let Some(first) = submitted.into_iter().next() else {
            return Err(Error::ExternalService(
                "Audio service returned no songs".to_string(),
            ));
        };
        let song_id = first.id.clone();
        debug!(song_id = %song_id, status = %first.status, "Song submitted");

        let audio = self.audio.as_ref();
        let ids = vec![song_id.clone()];
        let what = format!("song {}", song_id);
        let record = poll_until(&self.poll, cancel, &what, |_| {
            let ids = ids.clone();
            async move {
                let records = audio.get(&ids).await?;
                generation_status(records.into_iter().next())
            }
        })
        .await?;

        info!(
            song_id = %record.id,
            status = %record.status,
            duration_ms = start.elapsed().as_millis() as u64,
            "Song stream ready"
        );
        Ok(record)
    }

    /// One look at the song; never waits.
    #[instrument(skip(self), fields(subsystem = "pipeline", component = "synthesizer", op = "check_download"))]
    pub async fn check_download(&self, song_id: &str) -> Result<DownloadStatus> {
        let records = self.audio.get(&[song_id.to_string()]).await?;
        let status = match records.into_iter().next() {
            Some(record) if record.status == STATUS_COMPLETE => DownloadStatus::Ready {
                audio_url: record.audio_url,
            },
            Some(record) => {
                debug!(status = %record.status, "Song not complete yet");
                DownloadStatus::NotReady
            }
            None => {
                debug!("Song not found");
                DownloadStatus::NotReady
            }
        };
        Ok(status)
    }
}
