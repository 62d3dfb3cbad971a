//! Platter - scripted turntable scratching
//!
//! Plays or renders scratch routines: beat-timed platter moves and
//! crossfader gestures applied to a sample.

mod cli;
mod player;

use anyhow::{Context, Result};
use cli::{Command, Source, Target};
use platter_automation::Routine;
use platter_library::{Config, Session, WavRenderer};
use player::OutputDevice;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    let mut config = Config::load();

    match command {
        Command::Help => println!("{}", cli::USAGE),
        Command::Presets => {
            for name in Routine::preset_names() {
                println!("{name}");
            }
        }
        Command::Play(target) => {
            let device = OutputDevice::open_default()?;

            // Decode straight to the device rate so the engine clock matches it
            let mut play_config = config.clone();
            play_config.output_sample_rate = Some(device.sample_rate());

            let session = open_session(&target, &play_config)?;
            let sample = session.sample_path().to_path_buf();
            device.play(session.into_engine())?;
            remember_sample(&mut config, sample);
        }
        Command::Render { target, output } => {
            let mut session = open_session(&target, &config)?;
            let summary = WavRenderer::new(config.bit_depth)
                .render(session.engine_mut(), &output)
                .with_context(|| format!("Failed to render {}", output.display()))?;

            println!(
                "Rendered {} frames ({:.2}s, {} Hz, {} ch, {}-bit) to {}",
                summary.frames,
                summary.duration_secs,
                summary.sample_rate,
                summary.channels,
                summary.bit_depth.bits(),
                summary.path.display()
            );
            if summary.peak > 1.0 {
                warn!(peak = summary.peak, "output clipped");
            }

            let sample = session.sample_path().to_path_buf();
            remember_sample(&mut config, sample);
        }
    }

    Ok(())
}

fn open_session(target: &Target, config: &Config) -> Result<Session> {
    let sample = target.sample.as_deref();

    match &target.source {
        Source::Routine(path) => Session::open(path, sample, config)
            .with_context(|| format!("Failed to open routine {}", path.display())),
        Source::Preset(name) => {
            let mut config = config.clone();
            if let Some(bpm) = target.bpm {
                config.bpm = bpm;
            }
            if let Some(rpm) = target.rpm {
                config.rpm = rpm;
            }
            Session::from_preset(name, sample, &config)
                .with_context(|| format!("Failed to open preset '{name}'"))
        }
    }
}

/// Store the sample for the next preset run
fn remember_sample(config: &mut Config, sample: PathBuf) {
    let sample = sample.canonicalize().unwrap_or(sample);
    if config.last_sample.as_ref() == Some(&sample) {
        return;
    }

    config.last_sample = Some(sample);
    match config.save() {
        Ok(()) => info!(path = %Config::config_path().display(), "config saved"),
        Err(e) => warn!(error = %e, "failed to save config"),
    }
}
