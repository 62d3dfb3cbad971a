//! Playback engine - resamples the source buffer along a scratch trajectory
//!
//! The engine owns one piece of mutable state, the real-time clock. Each
//! pulled frame asks the position source where the head is and how loud the
//! fader is at the current time, reads every channel there and advances the
//! clock by one sample period. It is driven by a single consumer.

use crate::buffer::SampleBuffer;
use crate::error::PlaybackError;
use platter_automation::Sequencer;
use std::sync::Arc;
use tracing::debug;

/// Bytes per sample in the byte-level stream (little-endian f32)
pub const BYTES_PER_SAMPLE: usize = 4;

/// Maps real time (seconds) to `(head position in seconds, gain)`
pub type PositionFn = Box<dyn FnMut(f64) -> (f64, f64) + Send>;

/// Result of one pull
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Frames written to the front of the destination
    pub frames: usize,
    /// True once the clock has passed the configured duration
    pub done: bool,
}

/// Pull-based scratch resampler
pub struct PlaybackEngine {
    buffer: SampleBuffer,
    real_time: f64,
    max_duration: f64,
    position_fn: Option<PositionFn>,
    finished: bool,
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("sample_rate", &self.buffer.sample_rate())
            .field("num_channels", &self.buffer.num_channels())
            .field("real_time", &self.real_time)
            .field("max_duration", &self.max_duration)
            .field("has_position_fn", &self.position_fn.is_some())
            .finish()
    }
}

impl PlaybackEngine {
    /// Create an engine over `buffer`
    ///
    /// Output runs at the buffer's sample rate and channel count. The
    /// duration is unbounded until [`set_max_duration`] or
    /// [`set_sequencer`] is called.
    ///
    /// [`set_max_duration`]: PlaybackEngine::set_max_duration
    /// [`set_sequencer`]: PlaybackEngine::set_sequencer
    pub fn new(buffer: SampleBuffer) -> Self {
        Self {
            buffer,
            real_time: 0.0,
            max_duration: f64::INFINITY,
            position_fn: None,
            finished: false,
        }
    }

    pub fn set_position_and_gain_fn<F>(&mut self, f: F)
    where
        F: FnMut(f64) -> (f64, f64) + Send + 'static,
    {
        self.position_fn = Some(Box::new(f));
    }

    /// Stop producing frames once the clock passes `seconds`
    ///
    /// `f64::INFINITY` leaves the performance unbounded. NaN and negative
    /// durations are rejected and the previous duration is kept.
    pub fn set_max_duration(&mut self, seconds: f64) -> Result<(), PlaybackError> {
        if seconds.is_nan() || seconds < 0.0 {
            return Err(PlaybackError::InvalidDuration(seconds));
        }
        self.max_duration = seconds;
        Ok(())
    }

    /// Drive the engine from a sequencer, for exactly its total duration
    pub fn set_sequencer(&mut self, sequencer: Arc<Sequencer>) {
        self.max_duration = sequencer.total_duration();
        self.set_position_and_gain_fn(move |t| sequencer.position_and_gain_at(t));
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    pub fn num_channels(&self) -> usize {
        self.buffer.num_channels()
    }

    /// Configured performance length in seconds
    pub fn duration(&self) -> f64 {
        self.max_duration
    }

    /// Current clock position in seconds
    pub fn real_time(&self) -> f64 {
        self.real_time
    }

    pub fn is_finished(&self) -> bool {
        self.real_time > self.max_duration
    }

    /// Rewind the clock to the start of the performance
    pub fn reset(&mut self) {
        self.real_time = 0.0;
        self.finished = false;
    }

    /// Amplitude of `channel` at `pos_secs` in the source buffer
    pub fn sample_at(&self, pos_secs: f64, channel: usize) -> f32 {
        self.buffer.sample_at(pos_secs, channel)
    }

    /// Fill `out` with interleaved f32 frames
    ///
    /// `out.len()` must be a multiple of the channel count. Stops early when
    /// the clock passes the duration; the tail of `out` is left untouched.
    pub fn read_frames(&mut self, out: &mut [f32]) -> Result<ReadOutcome, PlaybackError> {
        let channels = self.buffer.num_channels();
        if out.len() % channels != 0 {
            return Err(PlaybackError::MisalignedBuffer {
                len: out.len(),
                frame_size: channels,
            });
        }

        self.pull(out.len() / channels, |frame, ch, value| {
            out[frame * channels + ch] = value;
        })
    }

    /// Fill `out` with interleaved little-endian f32 frames
    ///
    /// `out.len()` must be a multiple of `channels * 4` bytes, otherwise
    /// nothing is written.
    pub fn read_bytes(&mut self, out: &mut [u8]) -> Result<ReadOutcome, PlaybackError> {
        let channels = self.buffer.num_channels();
        let frame_size = channels * BYTES_PER_SAMPLE;
        if out.len() % frame_size != 0 {
            return Err(PlaybackError::MisalignedBuffer {
                len: out.len(),
                frame_size,
            });
        }

        self.pull(out.len() / frame_size, |frame, ch, value| {
            let offset = frame * frame_size + ch * BYTES_PER_SAMPLE;
            out[offset..offset + BYTES_PER_SAMPLE].copy_from_slice(&value.to_le_bytes());
        })
    }

    fn pull<W>(&mut self, requested: usize, mut write: W) -> Result<ReadOutcome, PlaybackError>
    where
        W: FnMut(usize, usize, f32),
    {
        let Some(position_fn) = self.position_fn.as_mut() else {
            return Err(PlaybackError::MissingPositionSource);
        };

        let channels = self.buffer.num_channels();
        let period = 1.0 / self.buffer.sample_rate() as f64;
        let mut frames = 0;

        while frames < requested && self.real_time <= self.max_duration {
            let (head, gain) = position_fn(self.real_time);
            let gain = gain as f32;

            for ch in 0..channels {
                write(frames, ch, self.buffer.sample_at(head, ch) * gain);
            }

            self.real_time += period;
            frames += 1;
        }

        let done = self.real_time > self.max_duration;
        if done && !self.finished {
            self.finished = true;
            debug!(
                real_time = self.real_time,
                max_duration = self.max_duration,
                "playback finished"
            );
        }

        Ok(ReadOutcome { frames, done })
    }
}
