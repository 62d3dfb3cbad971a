use thiserror::Error;

/// Errors from the sample buffer and the playback engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("buffer of {len} is not a whole number of {frame_size}-sized frames")]
    MisalignedBuffer { len: usize, frame_size: usize },
    #[error("no position source installed")]
    MissingPositionSource,
    #[error("sample buffer is empty")]
    EmptyBuffer,
    #[error("channel {channel} has {len} samples, expected {expected}")]
    ChannelMismatch {
        channel: usize,
        len: usize,
        expected: usize,
    },
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),
    #[error("invalid duration: {0} seconds")]
    InvalidDuration(f64),
}
