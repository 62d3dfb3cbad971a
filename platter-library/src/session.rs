//! Scratch sessions - a routine, its decoded sample and a ready engine

use crate::config::Config;
use crate::loader::{LoadError, SampleLoader, SampleMetadata};
use platter_audio::PlaybackEngine;
use platter_automation::{AutomationError, Routine, Sequencer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors that can occur while assembling a session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Routine error: {0}")]
    Automation(#[from] AutomationError),
    #[error("Sample error: {0}")]
    Load(#[from] LoadError),
    #[error("Unknown preset '{0}'")]
    UnknownPreset(String),
    #[error("No sample given and none configured")]
    NoSample,
}

/// Everything needed to play or render one routine
#[derive(Debug)]
pub struct Session {
    routine: Routine,
    sequencer: Arc<Sequencer>,
    sample_path: PathBuf,
    metadata: SampleMetadata,
    engine: PlaybackEngine,
}

impl Session {
    /// Load a routine file and its sample
    ///
    /// The sample is `sample_override` if given, else the routine's own
    /// `sample` (relative to the routine file), else the configured
    /// `last_sample`.
    pub fn open(
        routine_path: &Path,
        sample_override: Option<&Path>,
        config: &Config,
    ) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(routine_path).map_err(|source| SessionError::Io {
            path: routine_path.to_path_buf(),
            source,
        })?;
        let routine = Routine::parse(&content)?;

        let sample_path = match (sample_override, &routine.sample) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(path)) => resolve_relative(routine_path, path),
            (None, None) => config.last_sample.clone().ok_or(SessionError::NoSample)?,
        };

        Self::assemble(routine, sample_path, config)
    }

    /// Build a session for a built-in preset at the configured tempo
    pub fn from_preset(
        name: &str,
        sample_path: Option<&Path>,
        config: &Config,
    ) -> Result<Self, SessionError> {
        let routine = Routine::preset(name)
            .ok_or_else(|| SessionError::UnknownPreset(name.to_string()))?
            .with_tempo(config.bpm, config.rpm);

        let sample_path = sample_path
            .map(Path::to_path_buf)
            .or_else(|| config.last_sample.clone())
            .ok_or(SessionError::NoSample)?;

        Self::assemble(routine, sample_path, config)
    }

    fn assemble(routine: Routine, sample_path: PathBuf, config: &Config) -> Result<Self, SessionError> {
        // Validate the routine before paying for the decode
        let sequencer = Arc::new(routine.sequencer()?);

        let loader = match config.output_sample_rate {
            Some(rate) => SampleLoader::with_sample_rate(rate),
            None => SampleLoader::new(),
        };
        let loaded = loader.load(&sample_path)?;

        let mut engine = PlaybackEngine::new(loaded.buffer);
        engine.set_sequencer(Arc::clone(&sequencer));

        info!(
            sample = %sample_path.display(),
            actions = sequencer.len(),
            bpm = routine.bpm,
            rpm = routine.rpm,
            duration_secs = sequencer.total_duration(),
            "session ready"
        );

        Ok(Self {
            routine,
            sequencer,
            sample_path,
            metadata: loaded.metadata,
            engine,
        })
    }

    pub fn routine(&self) -> &Routine {
        &self.routine
    }

    pub fn sequencer(&self) -> &Arc<Sequencer> {
        &self.sequencer
    }

    pub fn sample_path(&self) -> &Path {
        &self.sample_path
    }

    pub fn metadata(&self) -> &SampleMetadata {
        &self.metadata
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine {
        &mut self.engine
    }

    /// Hand the engine to a player
    pub fn into_engine(self) -> PlaybackEngine {
        self.engine
    }
}

fn resolve_relative(routine_path: &Path, sample: &Path) -> PathBuf {
    if sample.is_absolute() {
        return sample.to_path_buf();
    }
    routine_path
        .parent()
        .map(|dir| dir.join(sample))
        .unwrap_or_else(|| sample.to_path_buf())
}
