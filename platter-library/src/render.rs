//! Offline rendering of a performance to a WAV file

use crate::config::BitDepth;
use hound::{SampleFormat, WavSpec, WavWriter};
use platter_audio::{PlaybackEngine, PlaybackError};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Frames pulled from the engine per block
pub const RENDER_BLOCK_FRAMES: usize = 4096;

/// Errors that can occur while rendering
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),
    #[error("Performance has no end, set a duration before rendering")]
    UnboundedDuration,
}

/// What a render produced
#[derive(Debug, Clone)]
pub struct RenderSummary {
    pub path: PathBuf,
    pub frames: usize,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: usize,
    pub bit_depth: BitDepth,
    /// Largest absolute sample value before clamping
    pub peak: f32,
}

/// Writes engine output to WAV with hound
#[derive(Debug, Default, Clone, Copy)]
pub struct WavRenderer {
    bit_depth: BitDepth,
}

impl WavRenderer {
    pub fn new(bit_depth: BitDepth) -> Self {
        Self { bit_depth }
    }

    /// Rewind `engine` and render the whole performance to `path`
    pub fn render(&self, engine: &mut PlaybackEngine, path: &Path) -> Result<RenderSummary, RenderError> {
        if !engine.duration().is_finite() {
            return Err(RenderError::UnboundedDuration);
        }

        let channels = engine.num_channels();
        let sample_rate = engine.sample_rate();
        let sample_format = match self.bit_depth {
            BitDepth::Float32 => SampleFormat::Float,
            BitDepth::Int16 | BitDepth::Int24 => SampleFormat::Int,
        };
        let spec = WavSpec {
            channels: channels as u16,
            sample_rate,
            bits_per_sample: self.bit_depth.bits(),
            sample_format,
        };

        let mut writer = WavWriter::create(path, spec)?;
        let mut block = vec![0.0f32; RENDER_BLOCK_FRAMES * channels];
        let mut frames = 0;
        let mut peak = 0.0f32;

        engine.reset();
        loop {
            let outcome = engine.read_frames(&mut block)?;
            let written = &block[..outcome.frames * channels];

            peak = written.iter().fold(peak, |p, s| p.max(s.abs()));
            self.write_block(&mut writer, written)?;
            frames += outcome.frames;

            if outcome.done || outcome.frames == 0 {
                break;
            }
        }

        writer.finalize()?;

        let summary = RenderSummary {
            path: path.to_path_buf(),
            frames,
            duration_secs: frames as f64 / sample_rate as f64,
            sample_rate,
            channels,
            bit_depth: self.bit_depth,
            peak,
        };

        info!(
            path = %path.display(),
            frames,
            duration_secs = summary.duration_secs,
            bits = self.bit_depth.bits(),
            "render complete"
        );

        Ok(summary)
    }

    fn write_block(
        &self,
        writer: &mut WavWriter<BufWriter<File>>,
        samples: &[f32],
    ) -> Result<(), hound::Error> {
        match self.bit_depth {
            BitDepth::Float32 => {
                for &sample in samples {
                    writer.write_sample(sample.clamp(-1.0, 1.0))?;
                }
            }
            BitDepth::Int24 => {
                for &sample in samples {
                    writer.write_sample((sample.clamp(-1.0, 1.0) * 8_388_607.0).round() as i32)?;
                }
            }
            BitDepth::Int16 => {
                for &sample in samples {
                    writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)?;
                }
            }
        }
        Ok(())
    }
}
