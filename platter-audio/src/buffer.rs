//! Decoded source audio, addressed in seconds with wrap-around

use crate::error::PlaybackError;

/// Per-channel normalized samples at a fixed rate
///
/// Every channel holds the same number of frames, and there is at least one
/// frame. Reads past either end wrap around, so the buffer behaves as a loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, PlaybackError> {
        if sample_rate == 0 {
            return Err(PlaybackError::InvalidSampleRate(sample_rate));
        }

        let expected = channels.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(PlaybackError::EmptyBuffer);
        }

        if let Some((channel, samples)) = channels
            .iter()
            .enumerate()
            .find(|(_, samples)| samples.len() != expected)
        {
            return Err(PlaybackError::ChannelMismatch {
                channel,
                len: samples.len(),
                expected,
            });
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Split interleaved samples (`L R L R ...`) into channels
    pub fn from_interleaved(
        samples: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self, PlaybackError> {
        if num_channels == 0 || samples.is_empty() {
            return Err(PlaybackError::EmptyBuffer);
        }
        if samples.len() % num_channels != 0 {
            return Err(PlaybackError::MisalignedBuffer {
                len: samples.len(),
                frame_size: num_channels,
            });
        }

        let frames = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Self::new(channels, sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames per channel
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Always false once constructed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Amplitude of `channel` at `pos_secs`, linearly interpolated
    ///
    /// The fractional index `pos_secs * sample_rate` is reduced modulo the
    /// buffer length (negative positions count back from the end) and the
    /// sample after the last one is the first. Out-of-range channels and
    /// non-finite positions read as silence.
    pub fn sample_at(&self, pos_secs: f64, channel: usize) -> f32 {
        let Some(samples) = self.channels.get(channel) else {
            return 0.0;
        };
        if !pos_secs.is_finite() {
            return 0.0;
        }

        let len = samples.len();
        let index = (pos_secs * self.sample_rate as f64).rem_euclid(len as f64);

        // rem_euclid can round up to `len` for tiny negative inputs
        let i0 = (index.floor() as usize).min(len - 1);
        let i1 = (i0 + 1) % len;
        let frac = (index - i0 as f64).clamp(0.0, 1.0) as f32;

        let s0 = samples[i0];
        let s1 = samples[i1];
        s0 + frac * (s1 - s0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32 / len as f32).collect()
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            SampleBuffer::new(Vec::new(), 44100),
            Err(PlaybackError::EmptyBuffer)
        );
        assert_eq!(
            SampleBuffer::new(vec![Vec::new()], 44100),
            Err(PlaybackError::EmptyBuffer)
        );
        assert_eq!(
            SampleBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100),
            Err(PlaybackError::ChannelMismatch {
                channel: 1,
                len: 3,
                expected: 4
            })
        );
        assert_eq!(
            SampleBuffer::new(vec![vec![0.0; 4]], 0),
            Err(PlaybackError::InvalidSampleRate(0))
        );
    }

    #[test]
    fn test_from_interleaved() {
        let buffer = SampleBuffer::from_interleaved(&[0.1, -0.1, 0.2, -0.2, 0.3, -0.3], 2, 8000).unwrap();
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.channel(0), Some(&[0.1, 0.2, 0.3][..]));
        assert_eq!(buffer.channel(1), Some(&[-0.1, -0.2, -0.3][..]));

        assert_eq!(
            SampleBuffer::from_interleaved(&[0.0; 5], 2, 8000),
            Err(PlaybackError::MisalignedBuffer { len: 5, frame_size: 2 })
        );
    }

    #[test]
    fn test_duration() {
        let buffer = SampleBuffer::new(vec![vec![0.0; 22050]], 44100).unwrap();
        assert!((buffer.duration() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_exact_samples() {
        let buffer = SampleBuffer::new(vec![ramp(10)], 10).unwrap();
        for i in 0..10 {
            let expected = i as f32 / 10.0;
            assert!((buffer.sample_at(i as f64 / 10.0, 0) - expected).abs() < EPS);
        }
    }

    #[test]
    fn test_linear_interpolation() {
        let buffer = SampleBuffer::new(vec![vec![0.0, 1.0, 0.0, -1.0]], 4).unwrap();
        // halfway between index 0 and 1
        assert!((buffer.sample_at(0.125, 0) - 0.5).abs() < EPS);
        // a quarter of the way from index 2 to 3
        assert!((buffer.sample_at(0.5625, 0) + 0.25).abs() < EPS);
    }

    #[test]
    fn test_wraps_past_end() {
        let buffer = SampleBuffer::new(vec![ramp(8)], 8).unwrap();
        let full = buffer.duration();
        assert_eq!(buffer.sample_at(full, 0), buffer.sample_at(0.0, 0));
        assert!((buffer.sample_at(full + 0.25, 0) - buffer.sample_at(0.25, 0)).abs() < EPS);

        // between the last sample and the first
        let last = buffer.channel(0).unwrap()[7];
        let mid = buffer.sample_at(7.5 / 8.0, 0);
        assert!((mid - last * 0.5).abs() < EPS);
    }

    #[test]
    fn test_negative_positions_count_back() {
        let buffer = SampleBuffer::new(vec![ramp(8)], 8).unwrap();
        assert!((buffer.sample_at(-0.125, 0) - buffer.sample_at(0.875, 0)).abs() < EPS);
        assert!((buffer.sample_at(-1.0, 0) - buffer.sample_at(0.0, 0)).abs() < EPS);
        // tiny negative offsets land next to index 0, not past the end
        assert!(buffer.sample_at(-1e-18, 0).abs() < EPS);
    }

    #[test]
    fn test_out_of_range_reads_silence() {
        let buffer = SampleBuffer::new(vec![vec![0.5; 4]], 4).unwrap();
        assert_eq!(buffer.sample_at(0.0, 3), 0.0);
        assert_eq!(buffer.sample_at(f64::NAN, 0), 0.0);
        assert_eq!(buffer.sample_at(f64::INFINITY, 0), 0.0);
    }
}
