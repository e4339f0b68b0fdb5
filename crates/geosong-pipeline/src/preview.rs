//! Downscaled JPEG previews for the lyrics prompt.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::{DynamicImage, ImageFormat};

use geosong_core::{Error, Result};

fn invalid_image(e: image::ImageError) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        e.to_string(),
    ))
}

/// Shrink an image to fit `max_dimension` (never enlarging it), convert it to
/// RGB, and return the JPEG bytes base64-encoded.
pub fn encode_preview(img: DynamicImage, max_dimension: u32) -> Result<String> {
    let img = if img.width() > max_dimension || img.height() > max_dimension {
        img.thumbnail(max_dimension, max_dimension)
    } else {
        img
    };

    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(invalid_image)?;

    Ok(base64::engine::general_purpose::STANDARD.encode(buffer.into_inner()))
}

/// Load an image from disk and encode its preview. Blocking.
pub fn encode_preview_file(path: &Path, max_dimension: u32) -> Result<String> {
    let img = image::open(path).map_err(invalid_image)?;
    encode_preview(img, max_dimension)
}
