//! # geosong-pipeline
//!
//! Turns uploaded photos and videos into a generated song.
//!
//! Stages, in order:
//! 1. [`MediaIngestionPipeline`]: EXIF GPS + reverse geocoding for images,
//!    vision-model descriptions for videos
//! 2. [`LyricsComposer`]: structured lyrics from the described media
//! 3. tag merging (`geosong_core::merge_tags`)
//! 4. [`AudioSynthesizer`]: submit to the audio service and wait for the stream
//!
//! [`SongPipeline`] wires the stages together. All remote services are reached
//! through the capability traits in `geosong-core`, so the pipeline runs
//! unchanged against real clients or test fakes.

pub mod composer;
pub mod describer;
pub mod geo;
pub mod ingest;
pub mod orchestrator;
pub mod poll;
pub mod preview;
pub mod synthesizer;

pub use composer::{build_messages, lyrics_schema, LyricsComposer};
pub use describer::VideoDescriber;
pub use geo::{location_from_results, GeoResolver};
pub use ingest::MediaIngestionPipeline;
pub use orchestrator::{PipelineConfig, SongPipeline};
pub use poll::{poll_until, PollPolicy, PollStatus};
pub use synthesizer::AudioSynthesizer;

pub use tokio_util::sync::CancellationToken;
