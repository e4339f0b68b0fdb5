//! Capture metadata extraction for still images.
//!
//! Reads the EXIF block of a photo and pulls out the pieces the lyrics prompt
//! needs: where it was taken (GPS) and when (DateTime). Missing, partial, or
//! corrupt metadata is a normal outcome, so nothing here returns an error.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use exif::{Exif, Field, In, Reader, Tag, Value};
use tracing::debug;

use crate::models::{CaptureMetadata, GeoTag};

/// Convert a degrees/minutes/seconds triple to decimal degrees.
///
/// ```
/// use geosong_core::exif::dms_to_dd;
///
/// let dd = dms_to_dd(48.0, 51.0, 24.0);
/// assert!((dd - 48.856_666).abs() < 1e-5);
/// ```
pub fn dms_to_dd(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

/// Apply a hemisphere reference to an unsigned decimal coordinate.
///
/// `S` and `W` yield a negative value; anything else keeps the magnitude
/// positive. The sign of the input is ignored, so applying the same reference
/// twice gives the same result.
pub fn apply_hemisphere(decimal: f64, reference: &str) -> f64 {
    match reference.trim().to_ascii_uppercase().as_str() {
        "S" | "W" => -decimal.abs(),
        _ => decimal.abs(),
    }
}

/// Read capture metadata from an image file on disk.
pub fn extract_capture_metadata(path: &Path) -> CaptureMetadata {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Could not open image for EXIF");
            return CaptureMetadata::default();
        }
    };
    let mut data = Vec::new();
    if let Err(e) = BufReader::new(file).read_to_end(&mut data) {
        debug!(path = %path.display(), error = %e, "Could not read image for EXIF");
        return CaptureMetadata::default();
    }
    extract_capture_metadata_from_bytes(&data)
}

/// Read capture metadata from raw image bytes.
pub fn extract_capture_metadata_from_bytes(data: &[u8]) -> CaptureMetadata {
    let mut reader = Reader::new();
    reader.continue_on_error(true);
    let mut cursor = Cursor::new(data);

    let exif = match reader
        .read_from_container(&mut cursor)
        .or_else(|e| e.distill_partial_result(|_| {}))
    {
        Ok(exif) => exif,
        Err(e) => {
            debug!(error = %e, "No readable EXIF block");
            return CaptureMetadata::default();
        }
    };

    CaptureMetadata {
        geotag: extract_geotag(&exif),
        datetime: ascii_field(&exif, Tag::DateTime)
            .or_else(|| ascii_field(&exif, Tag::DateTimeOriginal)),
        camera_model: ascii_field(&exif, Tag::Model),
    }
}

fn extract_geotag(exif: &Exif) -> Option<GeoTag> {
    let latitude = extract_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef)?;
    let longitude = extract_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef)?;
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    Some(GeoTag {
        latitude,
        longitude,
    })
}

fn extract_coordinate(exif: &Exif, coord_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let coord_field = exif.get_field(coord_tag, In::PRIMARY)?;
    // A missing hemisphere ref reads as north/east.
    let reference = ascii_field(exif, ref_tag).unwrap_or_default();

    let rationals = match &coord_field.value {
        Value::Rational(r) if r.len() >= 3 => r,
        _ => return None,
    };

    let decimal = dms_to_dd(
        rationals[0].to_f64(),
        rationals[1].to_f64(),
        rationals[2].to_f64(),
    );
    Some(apply_hemisphere(decimal, &reference))
}

/// First ASCII component of a field, trimmed of padding and NULs.
fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field: &Field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|bytes| {
                String::from_utf8_lossy(bytes)
                    .trim_matches(|c: char| c == '\0' || c.is_whitespace())
                    .to_string()
            })
            .find(|s| !s.is_empty()),
        _ => None,
    }
}
