//! End-to-end pipeline behaviour against in-memory capabilities.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use geosong_core::{ContentPart, DownloadStatus, Error, FileState, RequestMetadata};
use geosong_pipeline::CancellationToken;

use common::*;

const VIDEO_JSON: &str = r#"{"location":"Lyon, France","video_description":"Boats drifting on the Saone","mood_of_video":["calm","warm"]}"#;

fn two_cities() -> Arc<FakeGeocoder> {
    Arc::new(
        FakeGeocoder::default()
            .with_place(48, &["Paris", "Ile-de-France", "France"])
            .with_place(45, &["Lyon", "Auvergne-Rhone-Alpes", "France"]),
    )
}

fn text_parts(messages: &[geosong_core::ChatMessage]) -> Vec<String> {
    messages
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|p| match p {
            ContentPart::Text(t) => Some(t.clone()),
            ContentPart::ImageUrl(_) => None,
        })
        .collect()
}

#[tokio::test]
async fn test_two_geotagged_photos_produce_a_song() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![
        geotagged_jpeg(dir.path(), "paris.jpg", &PARIS, "2024:05:01 10:00:00"),
        geotagged_jpeg(dir.path(), "lyon.jpg", &LYON, "2024:05:02 18:30:00"),
    ];

    let geocoder = two_cities();
    let vision = Arc::new(FakeVision::new(&[], VIDEO_JSON));
    let chat = Arc::new(FakeChat::answering(&lyrics_json("Two Cities", &["folk"], 120)));
    let audio = Arc::new(FakeAudio::new(&["queued", "streaming"]));
    let pipeline = pipeline(&geocoder, &vision, &chat, &audio, fast_config(10));

    let metadata = RequestMetadata::from_json(r#"{"tags":["pop"],"language":"en"}"#).unwrap();
    let song = pipeline
        .run(&items, &metadata, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(song.id, "song-1");
    assert_eq!(song.title, "Two Cities");
    assert_eq!(song.song_bpm, 120);
    assert_eq!(song.language, "English");
    assert_eq!(song.singer, "Random");
    assert_eq!(song.audio_url, "https://cdn.test/song-1.mp3");
    assert_eq!(song.genre_tags, vec!["folk".to_string()]);

    let submitted = audio.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].tags, "pop BPM: 120bpm Language: en");
    assert!(!submitted[0].make_instrumental);
    assert!(!submitted[0].wait_audio);
    assert_eq!(submitted[0].model, "chirp-v3-5");
    assert_eq!(submitted[0].title, "Two Cities");

    let texts = text_parts(&chat.last_messages.lock().unwrap());
    assert!(texts.contains(&"The song should have the following genre: pop".to_string()));
    assert!(texts.contains(&"The song should be in the following language: English".to_string()));
    assert!(texts
        .iter()
        .any(|t| t.starts_with("Image 1:\nLocation: Paris, Ile-de-France, France")));
    assert!(texts
        .iter()
        .any(|t| t == "Image 2:\nLocation: Lyon, Auvergne-Rhone-Alpes, France\nDate/Time: 2024:05:02 18:30:00"));
    assert!(!texts[0].contains("video descriptions"));

    assert_eq!(audio.lookups.load(Ordering::SeqCst), 2);
    assert_eq!(vision.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_photos_without_gps_are_no_usable_media() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![plain_jpeg(dir.path(), "a.jpg"), plain_jpeg(dir.path(), "b.jpg")];

    let geocoder = two_cities();
    let vision = Arc::new(FakeVision::new(&[], VIDEO_JSON));
    let chat = Arc::new(FakeChat::answering(&lyrics_json("x", &["pop"], 100)));
    let audio = Arc::new(FakeAudio::new(&["streaming"]));
    let pipeline = pipeline(&geocoder, &vision, &chat, &audio, fast_config(10));

    let err = pipeline
        .run(&items, &RequestMetadata::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoUsableMedia));
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    assert!(audio.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unresolvable_location_drops_only_that_photo() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![
        geotagged_jpeg(dir.path(), "paris.jpg", &PARIS, "2024:05:01 10:00:00"),
        geotagged_jpeg(dir.path(), "lyon.jpg", &LYON, "2024:05:02 18:30:00"),
    ];

    let geocoder = Arc::new(FakeGeocoder::default().with_place(45, &["Lyon", "France"]));
    let vision = Arc::new(FakeVision::new(&[], VIDEO_JSON));
    let chat = Arc::new(FakeChat::answering(&lyrics_json("One City", &["jazz"], 90)));
    let audio = Arc::new(FakeAudio::new(&["streaming"]));
    let pipeline = pipeline(&geocoder, &vision, &chat, &audio, fast_config(10));

    pipeline
        .run(&items, &RequestMetadata::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
    let messages = chat.last_messages.lock().unwrap();
    let texts = text_parts(&messages);
    let image_texts: Vec<_> = texts.iter().filter(|t| t.starts_with("Image ")).collect();
    assert_eq!(image_texts.len(), 1);
    assert!(image_texts[0].starts_with("Image 1:\nLocation: Lyon, France"));
}

#[tokio::test]
async fn test_failed_video_aborts_before_composition() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![
        geotagged_jpeg(dir.path(), "paris.jpg", &PARIS, "2024:05:01 10:00:00"),
        video_file(dir.path(), "clip.mp4"),
    ];

    let geocoder = two_cities();
    let vision = Arc::new(FakeVision::new(
        &[FileState::Processing, FileState::Failed],
        VIDEO_JSON,
    ));
    let chat = Arc::new(FakeChat::answering(&lyrics_json("x", &["pop"], 100)));
    let audio = Arc::new(FakeAudio::new(&["streaming"]));
    let pipeline = pipeline(&geocoder, &vision, &chat, &audio, fast_config(10));

    let err = pipeline
        .run(&items, &RequestMetadata::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DescriptionFailed(_)));
    assert_eq!(vision.generations.load(Ordering::SeqCst), 0);
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    assert_eq!(*vision.deleted.lock().unwrap(), vec!["files/video-1".to_string()]);
}

#[tokio::test]
async fn test_video_is_described_after_processing_and_cleaned_up() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![
        video_file(dir.path(), "clip.mp4"),
        geotagged_jpeg(dir.path(), "paris.jpg", &PARIS, "2024:05:01 10:00:00"),
    ];

    let geocoder = two_cities();
    let vision = Arc::new(FakeVision::new(
        &[FileState::Processing, FileState::Processing, FileState::Active],
        VIDEO_JSON,
    ));
    let chat = Arc::new(FakeChat::answering(&lyrics_json("River", &["ambient"], 80)));
    let audio = Arc::new(FakeAudio::new(&["streaming"]));
    let pipeline = pipeline(&geocoder, &vision, &chat, &audio, fast_config(10));

    pipeline
        .run(&items, &RequestMetadata::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(vision.status_checks.load(Ordering::SeqCst), 2);
    assert_eq!(vision.generations.load(Ordering::SeqCst), 1);
    assert_eq!(vision.deleted.lock().unwrap().len(), 1);

    let texts = text_parts(&chat.last_messages.lock().unwrap());
    assert!(texts[0].contains("images / video descriptions"));
    let image_pos = texts.iter().position(|t| t.starts_with("Image 1:")).unwrap();
    let video_pos = texts.iter().position(|t| t.starts_with("Video 1:")).unwrap();
    assert!(image_pos < video_pos);
    assert_eq!(
        texts[video_pos],
        "Video 1:\nLocation: Lyon, France\nDescription: Boats drifting on the Saone\nMood: calm, warm"
    );
}

#[tokio::test]
async fn test_malformed_video_description_fails_request() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![video_file(dir.path(), "clip.mp4")];

    let geocoder = two_cities();
    let vision = Arc::new(FakeVision::new(&[FileState::Active], "not json"));
    let chat = Arc::new(FakeChat::answering(&lyrics_json("x", &["pop"], 100)));
    let audio = Arc::new(FakeAudio::new(&["streaming"]));
    let pipeline = pipeline(&geocoder, &vision, &chat, &audio, fast_config(10));

    let err = pipeline
        .run(&items, &RequestMetadata::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DescriptionFailed(_)));
    assert_eq!(vision.deleted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_streaming_ends_generation_wait_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![geotagged_jpeg(dir.path(), "paris.jpg", &PARIS, "2024:05:01 10:00:00")];

    let geocoder = two_cities();
    let vision = Arc::new(FakeVision::new(&[], VIDEO_JSON));
    let chat = Arc::new(FakeChat::answering(&lyrics_json("Paris", &["pop"], 100)));
    let audio = Arc::new(FakeAudio::new(&["streaming", "complete"]));
    let pipeline = pipeline(&geocoder, &vision, &chat, &audio, fast_config(10));

    pipeline
        .run(&items, &RequestMetadata::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(audio.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_user_bpm_and_singer_override_model_values() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![geotagged_jpeg(dir.path(), "paris.jpg", &PARIS, "2024:05:01 10:00:00")];

    let geocoder = two_cities();
    let vision = Arc::new(FakeVision::new(&[], VIDEO_JSON));
    let chat = Arc::new(FakeChat::answering(&lyrics_json("Paris", &["rock", "indie"], 100)));
    let audio = Arc::new(FakeAudio::new(&["streaming"]));
    let pipeline = pipeline(&geocoder, &vision, &chat, &audio, fast_config(10));

    let metadata =
        RequestMetadata::from_json(r#"{"bpm":140,"singer":"Nina","language":"fr"}"#).unwrap();
    let song = pipeline
        .run(&items, &metadata, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(song.song_bpm, 140);
    assert_eq!(song.singer, "Nina");
    assert_eq!(song.language, "French");
    assert_eq!(
        audio.submitted.lock().unwrap()[0].tags,
        "rock indie BPM: 140bpm Singer: Nina"
    );
}

#[tokio::test]
async fn test_lyrics_failure_is_lyrics_generation_error() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![geotagged_jpeg(dir.path(), "paris.jpg", &PARIS, "2024:05:01 10:00:00")];

    let geocoder = two_cities();
    let vision = Arc::new(FakeVision::new(&[], VIDEO_JSON));
    let chat = Arc::new(FakeChat::failing());
    let audio = Arc::new(FakeAudio::new(&["streaming"]));
    let pipeline = pipeline(&geocoder, &vision, &chat, &audio, fast_config(10));

    let err = pipeline
        .run(&items, &RequestMetadata::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::LyricsGeneration(_)));
    assert!(audio.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_zero_bpm_lyrics_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![geotagged_jpeg(dir.path(), "paris.jpg", &PARIS, "2024:05:01 10:00:00")];

    let geocoder = two_cities();
    let vision = Arc::new(FakeVision::new(&[], VIDEO_JSON));
    let chat = Arc::new(FakeChat::answering(&lyrics_json("Paris", &["pop"], 0)));
    let audio = Arc::new(FakeAudio::new(&["streaming"]));
    let pipeline = pipeline(&geocoder, &vision, &chat, &audio, fast_config(10));

    let err = pipeline
        .run(&items, &RequestMetadata::default(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::LyricsGeneration(_)));
}

#[tokio::test]
async fn test_generation_wait_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![geotagged_jpeg(dir.path(), "paris.jpg", &PARIS, "2024:05:01 10:00:00")];

    let geocoder = two_cities();
    let vision = Arc::new(FakeVision::new(&[], VIDEO_JSON));
    let chat = Arc::new(FakeChat::answering(&lyrics_json("Paris", &["pop"], 100)));
    let audio = Arc::new(FakeAudio::new(&["queued"]));
    let pipeline = pipeline(&geocoder, &vision, &chat, &audio, fast_config(4));

    let err = pipeline
        .run(&items, &RequestMetadata::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        Error::PollExhausted {
            attempts,
            last_status,
            ..
        } => {
            assert_eq!(attempts, 4);
            assert_eq!(last_status, "queued");
        }
        other => panic!("Expected PollExhausted, got {:?}", other),
    }
    assert_eq!(audio.lookups.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_cancelled_request_stops_video_wait() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![video_file(dir.path(), "clip.mp4")];

    let geocoder = two_cities();
    let vision = Arc::new(FakeVision::new(&[FileState::Processing; 50], VIDEO_JSON));
    let chat = Arc::new(FakeChat::answering(&lyrics_json("x", &["pop"], 100)));
    let audio = Arc::new(FakeAudio::new(&["streaming"]));
    let pipeline = pipeline(&geocoder, &vision, &chat, &audio, fast_config(100));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = pipeline
        .run(&items, &RequestMetadata::default(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled(_)));
    assert_eq!(vision.generations.load(Ordering::SeqCst), 0);
    assert_eq!(vision.deleted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_check_download() {
    let geocoder = two_cities();
    let vision = Arc::new(FakeVision::new(&[], VIDEO_JSON));
    let chat = Arc::new(FakeChat::failing());

    let audio = Arc::new(FakeAudio::new(&["streaming"]));
    let pending = pipeline(&geocoder, &vision, &chat, &audio, fast_config(1));
    assert_eq!(
        pending.check_download("song-1").await.unwrap(),
        DownloadStatus::NotReady
    );

    let audio = Arc::new(FakeAudio::new(&["complete"]));
    let done = pipeline(&geocoder, &vision, &chat, &audio, fast_config(1));
    assert_eq!(
        done.check_download("song-1").await.unwrap(),
        DownloadStatus::Ready {
            audio_url: "https://cdn.test/song-1.mp3".to_string()
        }
    );
    assert_eq!(audio.lookups.load(Ordering::SeqCst), 1);
}
