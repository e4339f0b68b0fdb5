//! # geosong-core
//!
//! Core types, traits, and pure song-building rules for geosong.
//!
//! This crate provides the data structures, capability traits, and
//! deterministic helpers (EXIF reading, tag merging, language expansion) that
//! the other geosong crates depend on.

pub mod defaults;
pub mod error;
pub mod exif;
pub mod file_safety;
pub mod language;
pub mod models;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use self::exif::{apply_hemisphere, dms_to_dd, extract_capture_metadata};
pub use file_safety::{classify_media, mime_type_for, sanitize_filename};
pub use language::expand_language_code;
pub use models::*;
pub use tags::{merge_tags, named_singer};
pub use traits::*;
