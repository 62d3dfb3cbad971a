//! Command-line parsing

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage:
  platter play   <routine-file | --preset NAME> [--sample PATH] [--bpm N] [--rpm N]
  platter render <routine-file | --preset NAME> [--sample PATH] [--bpm N] [--rpm N] --output OUT.wav
  platter presets

Environment:
  RUST_LOG    log filter (default: info)";

/// Where the actions come from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Routine(PathBuf),
    Preset(String),
}

/// A routine or preset plus the overrides that apply to it
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub source: Source,
    pub sample: Option<PathBuf>,
    pub bpm: Option<f64>,
    pub rpm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play(Target),
    Render { target: Target, output: PathBuf },
    Presets,
    Help,
}

/// Parse arguments (without the program name)
pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();

    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "presets" => Ok(Command::Presets),
        "help" | "-h" | "--help" => Ok(Command::Help),
        "play" => {
            let (target, output) = parse_target(args)?;
            if output.is_some() {
                bail!("--output only applies to render");
            }
            Ok(Command::Play(target))
        }
        "render" => {
            let (target, output) = parse_target(args)?;
            let output = output.ok_or_else(|| anyhow!("render needs --output OUT.wav"))?;
            Ok(Command::Render { target, output })
        }
        other => bail!("unknown command '{other}'"),
    }
}

fn parse_target<I>(mut args: I) -> Result<(Target, Option<PathBuf>)>
where
    I: Iterator<Item = String>,
{
    let mut routine = None;
    let mut preset = None;
    let mut sample = None;
    let mut output = None;
    let mut bpm = None;
    let mut rpm = None;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| anyhow!("{flag} needs a value"))
        };

        match arg.as_str() {
            "--preset" => preset = Some(value("--preset")?),
            "--sample" => sample = Some(PathBuf::from(value("--sample")?)),
            "--output" | "-o" => output = Some(PathBuf::from(value("--output")?)),
            "--bpm" => bpm = Some(parse_positive("--bpm", &value("--bpm")?)?),
            "--rpm" => rpm = Some(parse_positive("--rpm", &value("--rpm")?)?),
            flag if flag.starts_with('-') => bail!("unknown option '{flag}'"),
            path => {
                if routine.is_some() {
                    bail!("more than one routine file given");
                }
                routine = Some(PathBuf::from(path));
            }
        }
    }

    let source = match (routine, preset) {
        (Some(path), None) => Source::Routine(path),
        (None, Some(name)) => Source::Preset(name),
        (Some(_), Some(_)) => bail!("give either a routine file or --preset, not both"),
        (None, None) => bail!("missing routine file or --preset NAME"),
    };

    if matches!(source, Source::Routine(_)) && (bpm.is_some() || rpm.is_some()) {
        bail!("--bpm and --rpm only apply to presets, set them in the routine file instead");
    }

    Ok((
        Target {
            source,
            sample,
            bpm,
            rpm,
        },
        output,
    ))
}

fn parse_positive(flag: &str, value: &str) -> Result<f64> {
    let v: f64 = value
        .parse()
        .with_context(|| format!("{flag} expects a number, got '{value}'"))?;
    if !(v.is_finite() && v > 0.0) {
        bail!("{flag} must be positive, got {v}");
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_no_args_is_help() {
        assert_eq!(parse(&[]).unwrap(), Command::Help);
        assert_eq!(parse(&["--help"]).unwrap(), Command::Help);
    }

    #[test]
    fn test_play_routine() {
        let command = parse(&["play", "set/baby.routine", "--sample", "ahh.wav"]).unwrap();
        assert_eq!(
            command,
            Command::Play(Target {
                source: Source::Routine(PathBuf::from("set/baby.routine")),
                sample: Some(PathBuf::from("ahh.wav")),
                bpm: None,
                rpm: None,
            })
        );
    }

    #[test]
    fn test_render_preset_with_overrides() {
        let command = parse(&[
            "render", "--preset", "flare", "--bpm", "92", "--rpm", "45", "-o", "out.wav",
        ])
        .unwrap();
        match command {
            Command::Render { target, output } => {
                assert_eq!(target.source, Source::Preset("flare".into()));
                assert_eq!(target.bpm, Some(92.0));
                assert_eq!(target.rpm, Some(45.0));
                assert_eq!(output, PathBuf::from("out.wav"));
            }
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[test]
    fn test_rejections() {
        assert!(parse(&["render", "--preset", "baby"]).is_err());
        assert!(parse(&["play"]).is_err());
        assert!(parse(&["play", "a.routine", "--preset", "baby"]).is_err());
        assert!(parse(&["play", "a.routine", "b.routine"]).is_err());
        assert!(parse(&["play", "a.routine", "--bpm", "120"]).is_err());
        assert!(parse(&["play", "--preset", "baby", "--bpm", "-5"]).is_err());
        assert!(parse(&["play", "--preset"]).is_err());
        assert!(parse(&["play", "--preset", "baby", "--loud"]).is_err());
        assert!(parse(&["play", "--preset", "baby", "-o", "x.wav"]).is_err());
        assert!(parse(&["scratch"]).is_err());
    }
}
