//! Audio engine for Platter - sample buffers and scratch playback
//!
//! - SampleBuffer: decoded source audio, looped, read at fractional positions
//! - PlaybackEngine: pulls `(head, gain)` from a position source and
//!   resamples the buffer into interleaved frames

mod buffer;
mod engine;
mod error;

pub use buffer::SampleBuffer;
pub use engine::{PlaybackEngine, PositionFn, ReadOutcome, BYTES_PER_SAMPLE};
pub use error::PlaybackError;
