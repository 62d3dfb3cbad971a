//! Sample library for Platter - decoding, rendering, sessions and config

mod config;
mod loader;
mod render;
mod session;

pub use config::{BitDepth, Config};
pub use loader::{resample, LoadError, LoadedSample, SampleLoader, SampleMetadata};
pub use render::{RenderError, RenderSummary, WavRenderer, RENDER_BLOCK_FRAMES};
pub use session::{Session, SessionError};
