//! Sample file loading and decoding

use platter_audio::{PlaybackError, SampleBuffer};
use std::path::Path;
use symphonia::core::audio::SampleBuffer as DecodeBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, StandardTagKey};
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during sample loading
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Resample error: {0}")]
    Resample(String),
    #[error("Invalid sample data: {0}")]
    Buffer(#[from] PlaybackError),
}

/// Sample metadata
#[derive(Debug, Clone, Default)]
pub struct SampleMetadata {
    pub title: String,
    /// Length in seconds
    pub duration_secs: f64,
    /// Rate of the file on disk
    pub source_sample_rate: u32,
    /// Rate of the decoded buffer (differs from the source after resampling)
    pub sample_rate: u32,
    pub channels: usize,
}

/// A decoded sample, ready for the playback engine
#[derive(Debug, Clone)]
pub struct LoadedSample {
    pub buffer: SampleBuffer,
    pub metadata: SampleMetadata,
}

/// Audio file loader using Symphonia
#[derive(Debug, Default, Clone)]
pub struct SampleLoader {
    target_sample_rate: Option<u32>,
}

impl SampleLoader {
    /// Loader that keeps the file's own sample rate
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader that resamples everything to `target_sample_rate`
    pub fn with_sample_rate(target_sample_rate: u32) -> Self {
        Self {
            target_sample_rate: Some(target_sample_rate),
        }
    }

    /// Load and decode an audio file
    pub fn load(&self, path: &Path) -> Result<LoadedSample, LoadError> {
        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(LoadError::NoAudioTrack)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let source_sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| LoadError::Decode("unknown sample rate".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let title = extract_title(&mut format, path);

        // Channel count comes from the first decoded packet, which is
        // authoritative even when the container omits it
        let mut num_channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);
        let mut interleaved: Vec<f32> = Vec::new();
        let mut skipped_packets = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "stopping decode early");
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(_)) => {
                    skipped_packets += 1;
                    continue;
                }
                Err(e) => return Err(LoadError::Decode(e.to_string())),
            };

            let spec = *decoded.spec();
            num_channels = spec.channels.count();

            let mut sample_buf = DecodeBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(sample_buf.samples());
        }

        if skipped_packets > 0 {
            warn!(skipped_packets, "skipped undecodable packets");
        }

        let mut buffer = SampleBuffer::from_interleaved(&interleaved, num_channels, source_sample_rate)?;

        if let Some(target) = self.target_sample_rate {
            if target != source_sample_rate {
                let channels = (0..buffer.num_channels())
                    .filter_map(|ch| buffer.channel(ch))
                    .map(<[f32]>::to_vec)
                    .collect::<Vec<_>>();
                let resampled = resample(&channels, source_sample_rate, target)?;
                buffer = SampleBuffer::new(resampled, target)?;
                debug!(from = source_sample_rate, to = target, "resampled");
            }
        }

        let metadata = SampleMetadata {
            title,
            duration_secs: buffer.duration(),
            source_sample_rate,
            sample_rate: buffer.sample_rate(),
            channels: buffer.num_channels(),
        };

        info!(
            path = %path.display(),
            sample_rate = metadata.sample_rate,
            channels = metadata.channels,
            frames = buffer.len(),
            "sample loaded"
        );

        Ok(LoadedSample { buffer, metadata })
    }
}

/// Resample per-channel audio from `source_rate` to `target_rate`
///
/// The resampler's output delay is trimmed from the front and its tail is
/// flushed with silence, so sample `i` of the input lands at
/// `i * target / source` in the output. The output holds exactly
/// `ceil(frames * target / source)` frames.
pub fn resample(
    channels: &[Vec<f32>],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<Vec<f32>>, LoadError> {
    use rubato::{FftFixedInOut, Resampler};

    let num_channels = channels.len();
    let frames = channels.first().map(Vec::len).unwrap_or(0);
    if num_channels == 0 || frames == 0 {
        return Ok(vec![Vec::new(); num_channels]);
    }
    let expected_frames =
        (frames as u64 * target_rate as u64).div_ceil(source_rate as u64) as usize;

    let mut resampler = FftFixedInOut::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        1024,
        num_channels,
    )
    .map_err(|e| LoadError::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let wanted = delay + expected_frames;
    let chunk_size = resampler.input_frames_next();
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(wanted); num_channels];

    // Past the input, chunks are pure silence that push the tail out
    let mut pos = 0;
    while output[0].len() < wanted {
        let start = pos.min(frames);
        let end = (pos + chunk_size).min(frames);

        let chunk: Vec<Vec<f32>> = channels
            .iter()
            .map(|ch| {
                let mut v = ch[start..end].to_vec();
                v.resize(chunk_size, 0.0);
                v
            })
            .collect();

        let resampled = resampler
            .process(&chunk, None)
            .map_err(|e| LoadError::Resample(e.to_string()))?;

        for (out, data) in output.iter_mut().zip(resampled) {
            out.extend(data);
        }

        pos += chunk_size;
    }

    for channel in &mut output {
        channel.drain(..delay);
        channel.truncate(expected_frames);
    }

    Ok(output)
}

/// Title tag, falling back to the file stem
fn extract_title(format: &mut Box<dyn FormatReader>, path: &Path) -> String {
    let mut title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown")
        .to_string();

    if let Some(meta) = format.metadata().current() {
        for tag in meta.tags() {
            if let Some(StandardTagKey::TrackTitle) = tag.std_key {
                title = tag.value.to_string();
            }
        }
    }

    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_wav(name: &str, channels: u16, rate: u32, frames: usize) -> PathBuf {
        let path = std::env::temp_dir().join(format!("platter-loader-{}-{name}.wav", std::process::id()));
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..frames {
            for ch in 0..channels {
                let value = (i as f32 / frames as f32) * if ch == 0 { 1.0 } else { -1.0 };
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_load_stereo_wav() {
        let path = temp_wav("stereo", 2, 8000, 400);
        let loaded = SampleLoader::new().load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.metadata.channels, 2);
        assert_eq!(loaded.metadata.sample_rate, 8000);
        assert_eq!(loaded.buffer.len(), 400);
        assert!((loaded.metadata.duration_secs - 0.05).abs() < 1e-9);

        let left = loaded.buffer.channel(0).unwrap();
        let right = loaded.buffer.channel(1).unwrap();
        assert!((left[200] - 0.5).abs() < 1e-6);
        assert!((right[200] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_title_falls_back_to_file_stem() {
        let path = temp_wav("titled", 1, 8000, 10);
        let loaded = SampleLoader::new().load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(loaded.metadata.title.ends_with("titled"));
    }

    #[test]
    fn test_load_with_resampling() {
        let path = temp_wav("resample", 1, 44100, 4410);
        let loaded = SampleLoader::with_sample_rate(48000).load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.metadata.source_sample_rate, 44100);
        assert_eq!(loaded.metadata.sample_rate, 48000);
        assert_eq!(loaded.buffer.len(), 4800);
        assert!((loaded.metadata.duration_secs - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_resample_same_length_ratio() {
        let input = vec![vec![0.25f32; 1000], vec![-0.25f32; 1000]];
        let output = resample(&input, 8000, 16000).unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(output[0].len(), 2000);
        assert_eq!(output[1].len(), 2000);
    }

    #[test]
    fn test_resample_keeps_impulse_position() {
        let mut impulse = vec![0.0f32; 1000];
        impulse[100] = 1.0;
        let output = resample(&[impulse], 8000, 16000).unwrap();
        assert_eq!(output[0].len(), 2000);

        let peak = output[0]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!((198..=202).contains(&peak), "peak at {peak}");
    }

    #[test]
    fn test_resample_keeps_tail() {
        // only the last 100 input frames carry signal
        let mut input = vec![0.0f32; 3000];
        input[2900..].fill(0.5);
        let output = resample(&[input], 44100, 48000).unwrap();
        let len = output[0].len();
        assert_eq!(len, 3266);

        let tail = &output[0][len - 60..len - 30];
        assert!(tail.iter().all(|s| (s - 0.5).abs() < 0.05), "tail lost: {tail:?}");
    }

    #[test]
    fn test_resample_empty_input() {
        let output = resample(&[Vec::new(), Vec::new()], 44100, 48000).unwrap();
        assert_eq!(output, vec![Vec::<f32>::new(), Vec::new()]);
    }

    #[test]
    fn test_missing_file() {
        let result = SampleLoader::new().load(Path::new("/nonexistent/platter/sample.wav"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
