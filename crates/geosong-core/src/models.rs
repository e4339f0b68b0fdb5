//! Domain types shared by every geosong crate.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

// =============================================================================
// MEDIA
// =============================================================================

/// Kind of uploaded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted upload sitting in request-scoped temporary storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl MediaItem {
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self::new(path, MediaKind::Image)
    }

    pub fn video(path: impl Into<PathBuf>) -> Self {
        Self::new(path, MediaKind::Video)
    }
}

/// Decimal-degree coordinates (positive = North/East, negative = South/West).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTag {
    pub latitude: f64,
    pub longitude: f64,
}

/// Capture context read from an image's embedded metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureMetadata {
    pub geotag: Option<GeoTag>,
    /// Raw EXIF timestamp text ("YYYY:MM:DD HH:MM:SS").
    pub datetime: Option<String>,
    pub camera_model: Option<String>,
}

/// Structured output requested from the vision model for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDescription {
    pub location: String,
    pub video_description: String,
    pub mood_of_video: Vec<String>,
}

/// A media item annotated with location and/or description, ready for lyrics
/// composition.
///
/// Constructed only through [`DescribedMedia::image`] and
/// [`DescribedMedia::video`], which refuse items that carry neither a location
/// nor a description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribedMedia {
    pub source_kind: MediaKind,
    pub location_text: String,
    /// Capture timestamp for images, joined mood tags for videos.
    pub time_or_mood_context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_tags: Option<Vec<String>>,
}

impl DescribedMedia {
    /// Build an image entry. Returns `None` when the location is blank.
    pub fn image(
        location_text: impl Into<String>,
        datetime: impl Into<String>,
        base64_preview: impl Into<String>,
    ) -> Option<Self> {
        let location_text = location_text.into();
        if location_text.trim().is_empty() {
            return None;
        }
        Some(Self {
            source_kind: MediaKind::Image,
            location_text,
            time_or_mood_context: datetime.into(),
            base64_preview: Some(base64_preview.into()),
            description: None,
            mood_tags: None,
        })
    }

    /// Build a video entry. Returns `None` when both location and description
    /// are blank.
    pub fn video(described: VideoDescription) -> Option<Self> {
        if described.location.trim().is_empty() && described.video_description.trim().is_empty()
        {
            return None;
        }
        Some(Self {
            source_kind: MediaKind::Video,
            location_text: described.location,
            time_or_mood_context: described.mood_of_video.join(", "),
            base64_preview: None,
            description: Some(described.video_description),
            mood_tags: Some(described.mood_of_video),
        })
    }
}

// =============================================================================
// LYRICS
// =============================================================================

/// Structured lyrics returned by the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricsResult {
    pub title: String,
    pub lyrics: String,
    pub genre_tags: Vec<String>,
    pub song_bpm: u32,
}

// =============================================================================
// AUDIO
// =============================================================================

/// Body of an audio-generation submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRequest {
    pub prompt: String,
    pub title: String,
    pub tags: String,
    pub make_instrumental: bool,
    pub model: String,
    pub wait_audio: bool,
}

/// A song as reported by the audio-generation service. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub lyric: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub audio_url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub video_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub model_name: String,
    pub status: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prompt: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of a single download-phase check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    NotReady,
    Ready { audio_url: String },
}

// =============================================================================
// REQUEST
// =============================================================================

/// User overrides supplied alongside the uploaded media.
///
/// Unknown fields are rejected. Blank strings are normalized to absent so that
/// `{"singer": ""}` behaves exactly like omitting the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestMetadata {
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub singer: Option<String>,
    #[serde(default)]
    pub bpm: Option<u32>,
}

impl RequestMetadata {
    /// Parse and validate the `metadata` form field.
    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let parsed: Self = serde_json::from_str(raw)
            .map_err(|e| Error::Validation(format!("Invalid metadata: {}", e)))?;
        parsed.normalized()
    }

    fn normalized(self) -> Result<Self> {
        if self.bpm == Some(0) {
            return Err(Error::Validation(
                "Invalid metadata: bpm must be a positive integer".to_string(),
            ));
        }
        let blank_to_none = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Ok(Self {
            tags: self.tags,
            language: blank_to_none(self.language),
            singer: blank_to_none(self.singer),
            bpm: self.bpm,
        })
    }

    /// User tags, when present and non-empty.
    pub fn requested_tags(&self) -> Option<&[String]> {
        self.tags.as_deref().filter(|t| !t.is_empty())
    }
}

// =============================================================================
// RESULT
// =============================================================================

/// Response body of a finished song request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongResult {
    pub id: String,
    pub title: String,
    pub lyrics: String,
    pub genre_tags: Vec<String>,
    pub song_bpm: u32,
    pub audio_url: String,
    pub video_url: String,
    pub language: String,
    pub singer: String,
}
