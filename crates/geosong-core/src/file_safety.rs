//! Upload filename and media-type validation.
//!
//! Two layers:
//! 1. Extension allow-list (`jpg`, `jpeg`, `mp4`)
//! 2. Magic byte cross-check when the content is recognizable

use crate::defaults::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::models::MediaKind;

/// Lowercased extension of a filename, if it has one.
pub fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Media kind implied by a filename's extension.
pub fn kind_from_extension(filename: &str) -> Option<MediaKind> {
    let ext = file_extension(filename)?;
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Classify an uploaded file, or `None` when it must be rejected.
///
/// The extension decides the kind. When the bytes carry a recognizable
/// signature it has to agree with that kind, so a renamed executable or PNG
/// is refused even with a `.jpg` name.
pub fn classify_media(filename: &str, data: &[u8]) -> Option<MediaKind> {
    let kind = kind_from_extension(filename)?;
    match infer::get(data) {
        Some(detected) => {
            let agrees = match kind {
                MediaKind::Image => detected.mime_type() == "image/jpeg",
                MediaKind::Video => matches!(
                    detected.mime_type(),
                    "video/mp4" | "video/quicktime" | "video/x-m4v" | "audio/m4a"
                ),
            };
            agrees.then_some(kind)
        }
        None => Some(kind),
    }
}

/// MIME type to announce for a stored media file.
pub fn mime_type_for(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "image/jpeg",
        MediaKind::Video => "video/mp4",
    }
}

/// Sanitize filename for safe storage
pub fn sanitize_filename(filename: &str) -> String {
    // Remove path components
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c,
            '.' | '-' | '_' => c,
            c if c.is_whitespace() => '_',
            _ => '_',
        })
        .collect();

    // No hidden files or traversal remnants
    let sanitized = sanitized.trim_matches(|c| c == '.' || c == '_');
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    // Truncate if too long (preserve extension)
    if sanitized.len() > 255 {
        if let Some(dot_pos) = sanitized.rfind('.') {
            let ext = &sanitized[dot_pos..];
            if ext.len() < 255 {
                let name = &sanitized[..255 - ext.len()];
                return format!("{}{}", name, ext);
            }
        }
        return sanitized[..255].to_string();
    }

    sanitized.to_string()
}
