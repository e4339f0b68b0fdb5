//! Lyrics composition through the language-model capability.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value as JsonValue};
use tracing::{error, info, instrument, trace};

use geosong_core::defaults::LYRICS_MAX_TOKENS;
use geosong_core::{
    expand_language_code, ChatMessage, ContentPart, DescribedMedia, LyricsResult, MediaKind,
    StructuredChatBackend,
};

const SCHEMA_NAME: &str = "lyrics_response";

/// Strict output schema for [`LyricsResult`].
pub fn lyrics_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "lyrics": {"type": "string"},
            "genre_tags": {"type": "array", "items": {"type": "string"}},
            "song_bpm": {"type": "integer"}
        },
        "required": ["title", "lyrics", "genre_tags", "song_bpm"],
        "additionalProperties": false
    })
}

/// Build the prompt: system framing, optional genre and language hints, then
/// one message per image and one per video.
pub fn build_messages(
    media: &[DescribedMedia],
    genre_tags: Option<&[String]>,
    language: Option<&str>,
) -> Vec<ChatMessage> {
    let has_video = media.iter().any(|m| m.source_kind == MediaKind::Video);
    let mut messages = vec![ChatMessage::system(format!(
        "You are a talented songwriter. Generate song lyrics that capture the narrative of the series of images{} provided, considering their locations, mood and times.",
        if has_video { " / video descriptions" } else { "" }
    ))];

    if let Some(tags) = genre_tags.filter(|t| !t.is_empty()) {
        messages.push(ChatMessage::user(format!(
            "The song should have the following genre: {}",
            tags.join(", ")
        )));
    }

    if let Some(code) = language {
        messages.push(ChatMessage::user(format!(
            "The song should be in the following language: {}",
            expand_language_code(Some(code))
        )));
    }

    let images = media.iter().filter(|m| m.source_kind == MediaKind::Image);
    for (idx, image) in images.enumerate() {
        let mut parts = vec![ContentPart::Text(format!(
            "Image {}:\nLocation: {}\nDate/Time: {}",
            idx + 1,
            image.location_text,
            image.time_or_mood_context
        ))];
        if let Some(b64) = image.base64_preview.as_deref() {
            parts.push(ContentPart::ImageUrl(format!(
                "data:image/jpeg;base64,{}",
                b64
            )));
        }
        messages.push(ChatMessage::user_parts(parts));
    }

    let videos = media.iter().filter(|m| m.source_kind == MediaKind::Video);
    for (idx, video) in videos.enumerate() {
        let moods = video
            .mood_tags
            .as_ref()
            .map(|m| m.join(", "))
            .unwrap_or_default();
        messages.push(ChatMessage::user_parts(vec![ContentPart::Text(format!(
            "Video {}:\nLocation: {}\nDescription: {}\nMood: {}",
            idx + 1,
            video.location_text,
            video.description.as_deref().unwrap_or_default(),
            moods
        ))]));
    }

    messages
}

/// Validate and decode the model's JSON answer.
pub fn parse_lyrics(raw: &str) -> Option<LyricsResult> {
    match serde_json::from_str::<LyricsResult>(raw.trim()) {
        Ok(lyrics) if lyrics.song_bpm > 0 && !lyrics.lyrics.trim().is_empty() => Some(lyrics),
        Ok(lyrics) => {
            error!(song_bpm = lyrics.song_bpm, "Lyrics response failed validation");
            None
        }
        Err(e) => {
            error!(error = %e, "Lyrics response is not valid JSON for the schema");
            None
        }
    }
}

/// Composes lyrics from described media.
#[derive(Clone)]
pub struct LyricsComposer {
    chat: Arc<dyn StructuredChatBackend>,
    max_tokens: u32,
}

impl LyricsComposer {
    pub fn new(chat: Arc<dyn StructuredChatBackend>) -> Self {
        Self {
            chat,
            max_tokens: LYRICS_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// `None` on any failure; the caller decides how fatal that is.
    #[instrument(skip(self, media, genre_tags, language), fields(subsystem = "pipeline", component = "composer", op = "compose", model = %self.chat.model_name(), item_count = media.len()))]
    pub async fn compose(
        &self,
        media: &[DescribedMedia],
        genre_tags: Option<&[String]>,
        language: Option<&str>,
    ) -> Option<LyricsResult> {
        let start = Instant::now();
        let messages = build_messages(media, genre_tags, language);
        trace!(message_count = messages.len(), "Lyrics prompt built");

        let raw = match self
            .chat
            .complete_structured(&messages, SCHEMA_NAME, &lyrics_schema(), self.max_tokens)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "Lyrics generation failed");
                return None;
            }
        };

        let lyrics = parse_lyrics(&raw)?;
        info!(
            title = %lyrics.title,
            song_bpm = lyrics.song_bpm,
            duration_ms = start.elapsed().as_millis() as u64,
            "Lyrics composed"
        );
        Some(lyrics)
    }
}
