//! In-memory capability fakes and media fixtures shared by the pipeline tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use serde_json::Value as JsonValue;

use geosong_core::{
    AddressComponent, AudioBackend, ChatMessage, Error, FileState, GeocodeResult, MediaItem,
    RemoteFile, Result, ReverseGeocoder, SongRecord, SongRequest, StructuredChatBackend,
    VisionBackend,
};
use geosong_pipeline::{PipelineConfig, PollPolicy, SongPipeline};

// =============================================================================
// FIXTURES
// =============================================================================

fn rational(v: u32) -> Rational {
    Rational { num: v, denom: 1 }
}

fn ascii(s: &str) -> Value {
    Value::Ascii(vec![s.as_bytes().to_vec()])
}

fn field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

/// Coordinates in degrees/minutes/seconds, northern and eastern hemisphere.
pub struct Dms {
    pub lat: (u32, u32, u32),
    pub lon: (u32, u32, u32),
}

pub const PARIS: Dms = Dms {
    lat: (48, 51, 24),
    lon: (2, 21, 0),
};

pub const LYON: Dms = Dms {
    lat: (45, 45, 0),
    lon: (4, 50, 0),
};

fn jpeg_bytes(fields: &[Field]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(64, 48, image::Rgb([30, 120, 200]));
    let mut jpeg = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut jpeg, image::ImageFormat::Jpeg)
        .unwrap();
    let jpeg = jpeg.into_inner();

    if fields.is_empty() {
        return jpeg;
    }

    let mut tiff = Cursor::new(Vec::new());
    let mut writer = Writer::new();
    for f in fields {
        writer.push_field(f);
    }
    writer.write(&mut tiff, false).unwrap();

    let mut app1 = b"Exif\0\0".to_vec();
    app1.extend_from_slice(&tiff.into_inner());
    let seg_len = (app1.len() + 2) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + app1.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&seg_len.to_be_bytes());
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Write a JPEG geotagged at `at` and captured at `datetime`.
pub fn geotagged_jpeg(dir: &Path, name: &str, at: &Dms, datetime: &str) -> MediaItem {
    let fields = vec![
        field(Tag::GPSLatitudeRef, ascii("N")),
        field(
            Tag::GPSLatitude,
            Value::Rational(vec![rational(at.lat.0), rational(at.lat.1), rational(at.lat.2)]),
        ),
        field(Tag::GPSLongitudeRef, ascii("E")),
        field(
            Tag::GPSLongitude,
            Value::Rational(vec![rational(at.lon.0), rational(at.lon.1), rational(at.lon.2)]),
        ),
        field(Tag::DateTime, ascii(datetime)),
    ];
    let path = dir.join(name);
    std::fs::write(&path, jpeg_bytes(&fields)).unwrap();
    MediaItem::image(path)
}

/// Write a JPEG without any EXIF data.
pub fn plain_jpeg(dir: &Path, name: &str) -> MediaItem {
    let path = dir.join(name);
    std::fs::write(&path, jpeg_bytes(&[])).unwrap();
    MediaItem::image(path)
}

/// Write placeholder video bytes; the fake vision backend never reads them.
pub fn video_file(dir: &Path, name: &str) -> MediaItem {
    let path: PathBuf = dir.join(name);
    std::fs::write(&path, b"\0\0\0\x18ftypmp42").unwrap();
    MediaItem::video(path)
}

// =============================================================================
// GEOCODER
// =============================================================================

/// Answers by whole latitude degree; unknown latitudes get no results.
#[derive(Default)]
pub struct FakeGeocoder {
    places: Mutex<Vec<(i64, Vec<String>)>>,
    pub calls: AtomicU32,
}

impl FakeGeocoder {
    pub fn with_place(self, latitude_degree: i64, components: &[&str]) -> Self {
        self.places.lock().unwrap().push((
            latitude_degree,
            components.iter().map(|c| c.to_string()).collect(),
        ));
        self
    }
}

#[async_trait]
impl ReverseGeocoder for FakeGeocoder {
    async fn reverse_geocode(&self, latitude: f64, _longitude: f64) -> Result<Vec<GeocodeResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let places = self.places.lock().unwrap();
        Ok(places
            .iter()
            .filter(|(degree, _)| *degree == latitude.trunc() as i64)
            .map(|(_, names)| GeocodeResult {
                address_components: names
                    .iter()
                    .map(|n| AddressComponent {
                        long_name: n.clone(),
                        short_name: n.clone(),
                        types: vec![],
                    })
                    .collect(),
                formatted_address: None,
            })
            .collect())
    }
}

// =============================================================================
// VISION
// =============================================================================

/// Reports the scripted file states in order (upload first), then `ACTIVE`.
pub struct FakeVision {
    states: Mutex<VecDeque<FileState>>,
    response: String,
    pub uploads: AtomicU32,
    pub status_checks: AtomicU32,
    pub generations: AtomicU32,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeVision {
    pub fn new(states: &[FileState], response: &str) -> Self {
        Self {
            states: Mutex::new(states.iter().copied().collect()),
            response: response.to_string(),
            uploads: AtomicU32::new(0),
            status_checks: AtomicU32::new(0),
            generations: AtomicU32::new(0),
            deleted: Mutex::new(Vec::new()),
        }
    }

    fn next_state(&self) -> FileState {
        self.states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FileState::Active)
    }

    fn file(&self, name: &str, state: FileState) -> RemoteFile {
        RemoteFile {
            name: name.to_string(),
            uri: format!("https://files.test/{}", name),
            mime_type: "video/mp4".to_string(),
            state,
        }
    }
}

#[async_trait]
impl VisionBackend for FakeVision {
    async fn upload_file(&self, _path: &Path, _mime_type: &str) -> Result<RemoteFile> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(self.file(&format!("files/video-{}", n), self.next_state()))
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.file(name, self.next_state()))
    }

    async fn generate_structured(
        &self,
        _file: &RemoteFile,
        _prompt: &str,
        _schema: &JsonValue,
        _timeout: Duration,
    ) -> Result<String> {
        self.generations.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }

    async fn delete_file(&self, name: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }

    fn model_name(&self) -> &str {
        "fake-vision"
    }
}

// =============================================================================
// CHAT
// =============================================================================

/// Returns a fixed answer (or error) and records the prompt it was given.
pub struct FakeChat {
    response: Option<String>,
    pub calls: AtomicU32,
    pub last_messages: Mutex<Vec<ChatMessage>>,
}

impl FakeChat {
    pub fn answering(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            calls: AtomicU32::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            calls: AtomicU32::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StructuredChatBackend for FakeChat {
    async fn complete_structured(
        &self,
        messages: &[ChatMessage],
        _schema_name: &str,
        _schema: &JsonValue,
        _max_tokens: u32,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();
        self.response
            .clone()
            .ok_or_else(|| Error::ExternalService("model unavailable".to_string()))
    }

    fn model_name(&self) -> &str {
        "fake-chat"
    }
}

pub fn lyrics_json(title: &str, genre: &[&str], bpm: u32) -> String {
    serde_json::json!({
        "title": title,
        "lyrics": "City lights over the river\nWe keep walking",
        "genre_tags": genre,
        "song_bpm": bpm
    })
    .to_string()
}

// =============================================================================
// AUDIO
// =============================================================================

/// Submits one song and reports the scripted statuses on successive lookups,
/// repeating the last one.
pub struct FakeAudio {
    statuses: Mutex<VecDeque<String>>,
    pub submitted: Mutex<Vec<SongRequest>>,
    pub lookups: AtomicU32,
}

impl FakeAudio {
    pub fn new(statuses: &[&str]) -> Self {
        Self {
            statuses: Mutex::new(statuses.iter().map(|s| s.to_string()).collect()),
            submitted: Mutex::new(Vec::new()),
            lookups: AtomicU32::new(0),
        }
    }

    fn record(status: &str) -> SongRecord {
        serde_json::from_value(serde_json::json!({
            "id": "song-1",
            "title": "Two Cities",
            "status": status,
            "audio_url": "https://cdn.test/song-1.mp3",
            "video_url": "https://cdn.test/song-1.mp4",
        }))
        .unwrap()
    }
}

#[async_trait]
impl AudioBackend for FakeAudio {
    async fn submit(&self, request: &SongRequest) -> Result<Vec<SongRecord>> {
        self.submitted.lock().unwrap().push(request.clone());
        Ok(vec![Self::record("submitted")])
    }

    async fn get(&self, _ids: &[String]) -> Result<Vec<SongRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let status = if statuses.len() > 1 {
            statuses.pop_front().unwrap_or_default()
        } else {
            statuses.front().cloned().unwrap_or_default()
        };
        Ok(vec![Self::record(&status)])
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

pub fn fast_config(max_attempts: u32) -> PipelineConfig {
    PipelineConfig {
        poll: PollPolicy::new(Duration::from_millis(1), max_attempts),
        ..PipelineConfig::default()
    }
}

pub fn pipeline(
    geocoder: &Arc<FakeGeocoder>,
    vision: &Arc<FakeVision>,
    chat: &Arc<FakeChat>,
    audio: &Arc<FakeAudio>,
    config: PipelineConfig,
) -> SongPipeline {
    SongPipeline::new(
        geocoder.clone(),
        vision.clone(),
        chat.clone(),
        audio.clone(),
        config,
    )
}
