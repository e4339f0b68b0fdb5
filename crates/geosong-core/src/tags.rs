//! Tag string construction for audio generation requests.
//!
//! The audio capability takes one free-form "tags" string that carries genre,
//! tempo, and either a singer or a language hint. User-supplied values always
//! win over the ones the language model suggested.

use crate::defaults::SINGER_RANDOM;
use crate::models::{LyricsResult, RequestMetadata};

/// Merge AI-derived and user-supplied values into the final tag string.
///
/// Precedence:
/// 1. user tags (when non-empty) replace the model's genre tags;
/// 2. user BPM replaces the model's BPM;
/// 3. a named singer (anything except `"random"`) adds `Singer: ..`;
/// 4. otherwise a language adds `Language: ..`.
///
/// Singer and language never appear together.
///
/// ```
/// use geosong_core::{merge_tags, LyricsResult, RequestMetadata};
///
/// let lyrics = LyricsResult {
///     title: "t".into(),
///     lyrics: "l".into(),
///     genre_tags: vec!["rock".into()],
///     song_bpm: 90,
/// };
/// let meta = RequestMetadata {
///     tags: Some(vec!["pop".into()]),
///     bpm: Some(120),
///     singer: Some("Alex".into()),
///     language: None,
/// };
/// assert_eq!(merge_tags(&lyrics, &meta), "pop BPM: 120bpm Singer: Alex");
/// ```
pub fn merge_tags(lyrics: &LyricsResult, metadata: &RequestMetadata) -> String {
    let base_tags = metadata
        .requested_tags()
        .unwrap_or(lyrics.genre_tags.as_slice());

    let mut parts: Vec<String> = base_tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    let bpm = metadata.bpm.unwrap_or(lyrics.song_bpm);
    parts.push(format!("BPM: {}bpm", bpm));

    if let Some(singer) = named_singer(metadata) {
        parts.push(format!("Singer: {}", singer));
    } else if let Some(language) = metadata.language.as_deref() {
        parts.push(format!("Language: {}", language));
    }

    parts.join(" ")
}

/// The requested singer unless it is absent or the "random" sentinel.
pub fn named_singer(metadata: &RequestMetadata) -> Option<&str> {
    metadata
        .singer
        .as_deref()
        .filter(|s| *s != SINGER_RANDOM)
}
