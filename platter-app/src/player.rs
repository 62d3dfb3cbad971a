//! Live playback through the default cpal output device

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use platter_audio::{PlaybackEngine, PlaybackError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Events sent from the audio callback to the main thread
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The engine reached the end of the performance
    Finished,
    Error(String),
}

/// Time to let the device drain its last buffers before closing the stream
const DRAIN_TIME: Duration = Duration::from_millis(250);

/// Extra wait past the performance length before giving up on the device
const STALL_MARGIN: Duration = Duration::from_secs(2);

/// Source frames pulled per step when adapting channel layouts
const SCRATCH_FRAMES: usize = 4096;

/// Default output device and its preferred stream config
pub struct OutputDevice {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
}

impl OutputDevice {
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No audio output device found"))?;
        let config = device
            .default_output_config()
            .context("Failed to get audio config")?;

        debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = config.sample_rate().0,
            channels = config.channels(),
            "output device"
        );

        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate().0
    }

    pub fn channels(&self) -> usize {
        self.config.channels() as usize
    }

    /// Play `engine` to completion, blocking the calling thread
    pub fn play(self, engine: PlaybackEngine) -> Result<()> {
        let out_channels = self.channels();
        let src_channels = engine.num_channels();
        let duration = engine.duration();

        let engine = Arc::new(Mutex::new(engine));
        let engine_for_callback = Arc::clone(&engine);
        let (event_tx, event_rx) = bounded(1);
        let error_tx = event_tx.clone();

        // Fixed size, the callback never allocates
        let mut scratch = vec![0.0f32; SCRATCH_FRAMES * src_channels];

        let stream = self.device.build_output_stream(
            &self.config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                // try_lock keeps the real-time thread from blocking;
                // on contention output silence
                let Some(mut engine) = engine_for_callback.try_lock() else {
                    data.fill(0.0);
                    return;
                };

                let result = if src_channels == out_channels {
                    engine.read_frames(data).map(|outcome| {
                        data[outcome.frames * out_channels..].fill(0.0);
                        outcome.done
                    })
                } else {
                    fill_adapted(&mut engine, data, out_channels, &mut scratch)
                };

                match result {
                    Ok(true) => notify(&event_tx, PlayerEvent::Finished),
                    Ok(false) => {}
                    Err(e) => {
                        data.fill(0.0);
                        notify(&event_tx, PlayerEvent::Error(e.to_string()));
                    }
                }
            },
            stream_error_handler(error_tx),
            None,
        )
        .context("Failed to create audio stream")?;

        stream.play().context("Failed to start audio")?;
        info!(duration_secs = duration, "playing");

        wait_for_end(&event_rx, playback_limit(duration))?;
        std::thread::sleep(DRAIN_TIME);
        info!("playback finished");
        Ok(())
    }
}

/// Report once; later sends find the channel full and are dropped
fn notify(tx: &Sender<PlayerEvent>, event: PlayerEvent) {
    let _ = tx.try_send(event);
}

/// Forward stream failures (device unplugged, backend errors) to the waiting thread
fn stream_error_handler(tx: Sender<PlayerEvent>) -> impl FnMut(cpal::StreamError) + Send + 'static {
    move |err| {
        warn!(error = %err, "audio stream error");
        notify(&tx, PlayerEvent::Error(err.to_string()));
    }
}

/// Longest wait for the end of a performance of `duration` seconds
fn playback_limit(duration: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(duration)
        .ok()
        .map(|d| d.saturating_add(STALL_MARGIN))
}

/// Block until the callback reports, or `limit` runs out
fn wait_for_end(events: &Receiver<PlayerEvent>, limit: Option<Duration>) -> Result<()> {
    let event = match limit {
        Some(limit) => events.recv_timeout(limit).map_err(|e| match e {
            RecvTimeoutError::Timeout => {
                anyhow!("Audio device stalled, no end of playback after {:.1}s", limit.as_secs_f64())
            }
            RecvTimeoutError::Disconnected => anyhow!("Audio callback stopped without reporting"),
        })?,
        None => events
            .recv()
            .context("Audio callback stopped without reporting")?,
    };

    match event {
        PlayerEvent::Finished => Ok(()),
        PlayerEvent::Error(message) => Err(anyhow!("Playback failed: {message}")),
    }
}

/// Fill `data` with `out_channels`-wide frames from an engine of another width
///
/// Source frames are pulled through `scratch` at most
/// `scratch.len() / engine.num_channels()` at a time. Everything after the
/// end of the performance is silence. Returns whether the engine is done.
fn fill_adapted(
    engine: &mut PlaybackEngine,
    data: &mut [f32],
    out_channels: usize,
    scratch: &mut [f32],
) -> Result<bool, PlaybackError> {
    let src_channels = engine.num_channels();
    let block_frames = scratch.len() / src_channels;
    if block_frames == 0 {
        return Err(PlaybackError::MisalignedBuffer {
            len: scratch.len(),
            frame_size: src_channels,
        });
    }

    let mut done = false;
    for chunk in data.chunks_mut(block_frames * out_channels) {
        if done {
            chunk.fill(0.0);
            continue;
        }

        let frames = chunk.len() / out_channels;
        let source = &mut scratch[..frames * src_channels];
        let outcome = engine.read_frames(source)?;
        let written = outcome.frames;

        map_channels(
            &source[..written * src_channels],
            src_channels,
            &mut chunk[..written * out_channels],
            out_channels,
        );
        chunk[written * out_channels..].fill(0.0);
        done = outcome.done;
    }

    Ok(done)
}

/// Copy interleaved frames between channel layouts
///
/// Mono output averages every source channel. Otherwise output channel `c`
/// takes source channel `c`, repeating the last source channel when the
/// output has more.
pub fn map_channels(src: &[f32], src_channels: usize, dst: &mut [f32], dst_channels: usize) {
    for (src_frame, dst_frame) in src
        .chunks_exact(src_channels)
        .zip(dst.chunks_exact_mut(dst_channels))
    {
        if dst_channels == 1 {
            dst_frame[0] = src_frame.iter().sum::<f32>() / src_channels as f32;
        } else {
            for (c, sample) in dst_frame.iter_mut().enumerate() {
                *sample = src_frame[c.min(src_channels - 1)];
            }
        }
    }
}
