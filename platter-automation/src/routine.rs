//! Routines - a tempo, a platter speed, an optional sample and an action list
//!
//! Routines come from the built-in presets or from a small line-oriented
//! text format:
//!
//! ```text
//! # baby scratch with a chopped return
//! bpm = 100
//! rpm = 33
//! sample = voice.wav
//! action platter=0..0.125 beats=1 easing=smooth fader=open
//! action platter=0.125..0 beats=0.5 easing=sharp fader=micro:__-_-_ curve=OutExpo
//! ```

use crate::action::ScratchAction;
use crate::easing::{Curve, Easing};
use crate::envelope::Envelope;
use crate::error::AutomationError;
use crate::gesture::Gesture;
use crate::sequencer::Sequencer;
use std::path::PathBuf;

pub const DEFAULT_BPM: f64 = 100.0;
pub const DEFAULT_RPM: f64 = 33.0;

/// Curve used by micro-pattern faders when no `curve=` is given
pub const DEFAULT_MICRO_CURVE: Curve = Curve::OutExpo;

const PRESETS: &[&str] = &["baby", "chirp", "transformer", "flare", "crab", "release"];

/// A complete scratch performance description
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    /// Tempo in beats per minute
    pub bpm: f64,
    /// Platter speed in revolutions per minute
    pub rpm: f64,
    /// Source recording, relative paths resolve against the routine file
    pub sample: Option<PathBuf>,
    pub actions: Vec<ScratchAction>,
}

impl Default for Routine {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            rpm: DEFAULT_RPM,
            sample: None,
            actions: Vec::new(),
        }
    }
}

impl Routine {
    pub fn new(actions: Vec<ScratchAction>) -> Self {
        Self {
            actions,
            ..Default::default()
        }
    }

    pub fn with_tempo(mut self, bpm: f64, rpm: f64) -> Self {
        self.bpm = bpm;
        self.rpm = rpm;
        self
    }

    /// Seconds per beat
    pub fn beat_duration(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Seconds per platter revolution
    pub fn platter_revolution_duration(&self) -> f64 {
        60.0 / self.rpm
    }

    /// Build a sequencer from this routine's actions and tempo
    pub fn sequencer(&self) -> Result<Sequencer, AutomationError> {
        Sequencer::from_bpm_rpm(self.actions.clone(), self.bpm, self.rpm)
    }

    /// Names accepted by [`Routine::preset`]
    pub fn preset_names() -> &'static [&'static str] {
        PRESETS
    }

    /// Built-in routine by name, at the default tempo
    pub fn preset(name: &str) -> Option<Self> {
        let eighth = 1.0 / 8.0;
        let quarter = 1.0 / 4.0;

        let actions = match name.trim().to_ascii_lowercase().as_str() {
            // Forward and back an eighth of a turn, fader open
            "baby" => vec![
                ScratchAction::new(0.0, eighth, 1.0).with_easing(Easing::Smooth),
                ScratchAction::new(eighth, 0.0, 1.0).with_easing(Easing::Smooth),
            ],
            "chirp" => vec![
                ScratchAction::new(0.0, eighth, 0.5)
                    .with_easing(Easing::Sharp)
                    .with_gesture(Gesture::Cut),
                ScratchAction::new(eighth, 0.0, 0.5)
                    .with_easing(Easing::Sharp)
                    .with_gesture(Gesture::Cut),
            ],
            "transformer" => vec![
                ScratchAction::new(0.0, quarter, 2.0).with_gesture(Gesture::Transform),
                ScratchAction::new(quarter, 0.0, 2.0).with_gesture(Gesture::Transform),
            ],
            "flare" => vec![
                ScratchAction::new(0.0, quarter, 1.0)
                    .with_easing(Easing::Smooth)
                    .with_gesture(Gesture::Flare1),
                ScratchAction::new(quarter, 0.0, 1.0)
                    .with_easing(Easing::Smooth)
                    .with_gesture(Gesture::Flare1),
            ],
            "crab" => vec![
                ScratchAction::new(0.0, quarter, 1.0)
                    .with_easing(Easing::Smooth)
                    .with_gesture(Gesture::Crab),
                ScratchAction::new(quarter, 0.0, 1.0)
                    .with_easing(Easing::Smooth)
                    .with_gesture(Gesture::Crab),
            ],
            // Let go of the record, then pull it back with the fader cut
            "release" => vec![
                ScratchAction::new(0.0, 0.5, 2.0).with_easing(Easing::MotorStart),
                ScratchAction::new(0.5, 0.0, 1.0)
                    .with_easing(Easing::Spinback)
                    .with_gesture(Gesture::Closed),
            ],
            _ => return None,
        };

        Some(Self::new(actions))
    }

    /// Parse a routine from its text form
    ///
    /// Errors carry the 1-based line number they were found on.
    pub fn parse(content: &str) -> Result<Self, AutomationError> {
        let mut routine = Self::default();

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parse_err = |message: String| AutomationError::Parse {
                line: line_no,
                message,
            };

            if let Some(rest) = line.strip_prefix("action") {
                if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                    return Err(parse_err(format!("unknown statement '{line}'")));
                }
                let action = parse_action(rest).map_err(parse_err)?;
                routine.actions.push(action);
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(parse_err(format!("expected 'key = value', got '{line}'")));
            };
            let value = value.trim();

            match key.trim() {
                "bpm" => routine.bpm = parse_positive("bpm", value).map_err(parse_err)?,
                "rpm" => routine.rpm = parse_positive("rpm", value).map_err(parse_err)?,
                "sample" => {
                    if value.is_empty() {
                        return Err(parse_err("sample path is empty".to_string()));
                    }
                    routine.sample = Some(PathBuf::from(value));
                }
                other => return Err(parse_err(format!("unknown setting '{other}'"))),
            }
        }

        Ok(routine)
    }
}

fn parse_number(field: &str, value: &str) -> Result<f64, String> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid {field} '{value}'"))
}

fn parse_positive(field: &str, value: &str) -> Result<f64, String> {
    let v = parse_number(field, value)?;
    if v <= 0.0 {
        return Err(format!("{field} must be positive, got {v}"));
    }
    Ok(v)
}

enum FaderSpec {
    Gesture(Gesture),
    Micro(String),
}

/// Parse the `key=value` fields after `action`
fn parse_action(fields: &str) -> Result<ScratchAction, String> {
    let mut platter = None;
    let mut beats = 1.0;
    let mut easing = Easing::default();
    let mut fader = FaderSpec::Gesture(Gesture::default());
    let mut curve = None;

    for field in fields.split_whitespace() {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| format!("expected 'key=value', got '{field}'"))?;

        match key {
            "platter" => {
                let (start, end) = value
                    .split_once("..")
                    .ok_or_else(|| format!("platter must be 'start..end', got '{value}'"))?;
                platter = Some((parse_number("platter", start)?, parse_number("platter", end)?));
            }
            "beats" => beats = parse_positive("beats", value)?,
            "easing" => easing = value.parse().map_err(|e: AutomationError| e.to_string())?,
            "fader" => {
                fader = match value.strip_prefix("micro:") {
                    Some(pattern) => FaderSpec::Micro(pattern.to_string()),
                    None => FaderSpec::Gesture(
                        value.parse().map_err(|e: AutomationError| e.to_string())?,
                    ),
                };
            }
            "curve" => {
                curve = Some(
                    value
                        .parse::<Curve>()
                        .map_err(|e| e.to_string())?,
                );
            }
            other => return Err(format!("unknown action field '{other}'")),
        }
    }

    let (start, end) = platter.ok_or_else(|| "action is missing 'platter=start..end'".to_string())?;
    let action = ScratchAction::new(start, end, beats).with_easing(easing);

    match fader {
        FaderSpec::Gesture(gesture) => {
            if curve.is_some() {
                return Err("'curve' only applies to micro fader patterns".to_string());
            }
            Ok(action.with_gesture(gesture))
        }
        FaderSpec::Micro(pattern) => {
            let envelope = Envelope::from_pattern(
                1.0,
                &pattern,
                curve.unwrap_or(DEFAULT_MICRO_CURVE),
            )
            .map_err(|e| e.to_string())?;
            Ok(action.with_fader_envelope(envelope))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Fader;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_parse_full_routine() {
        let text = "\
# baby scratch with a chopped return
bpm = 90
rpm = 45
sample = voice.wav

action platter=0..0.125 beats=1 easing=smooth fader=open
action platter=0.125..0 beats=0.5 easing=^ fader=micro:__-_-_ curve=InOutSine
";
        let routine = Routine::parse(text).unwrap();
        assert_eq!(routine.bpm, 90.0);
        assert_eq!(routine.rpm, 45.0);
        assert_eq!(routine.sample, Some(PathBuf::from("voice.wav")));
        assert_eq!(routine.actions.len(), 2);

        let first = &routine.actions[0];
        assert_eq!(first.platter_end(), 0.125);
        assert_eq!(first.easing(), Easing::Smooth);
        assert_eq!(first.fader(), &Fader::Gesture(Gesture::Open));

        let second = &routine.actions[1];
        assert_eq!(second.duration_in_beats(), 0.5);
        assert_eq!(second.easing(), Easing::Sharp);
        match second.fader() {
            Fader::Envelope(env) => {
                assert_eq!(env.num_intervals(), 5);
                assert!(env.curves().iter().all(|c| *c == Curve::InOutSine));
            }
            other => panic!("expected micro envelope, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_defaults() {
        let routine = Routine::parse("action platter=0..1").unwrap();
        assert_eq!(routine.bpm, DEFAULT_BPM);
        assert_eq!(routine.rpm, DEFAULT_RPM);
        assert!(routine.sample.is_none());

        let action = &routine.actions[0];
        assert_eq!(action.duration_in_beats(), 1.0);
        assert_eq!(action.easing(), Easing::Linear);
        assert_eq!(action.fader(), &Fader::Gesture(Gesture::Open));
    }

    #[test]
    fn test_micro_fader_default_curve() {
        let routine = Routine::parse("action platter=0..1 fader=micro:-_").unwrap();
        match routine.actions[0].fader() {
            Fader::Envelope(env) => assert_eq!(env.curves(), &[DEFAULT_MICRO_CURVE]),
            other => panic!("expected micro envelope, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_errors_report_line() {
        let cases = [
            ("bpm = fast", 1),
            ("# ok\nbpm = 0", 2),
            ("\n\ntempo = 100", 3),
            ("action beats=1", 1),
            ("action platter=0..1\naction platter=0..1 easing=wobble", 2),
            ("action platter=0..1 fader=micro:_x_", 1),
            ("action platter=0..1 fader=cut curve=OutExpo", 1),
            ("action platter=0..1 speed=2", 1),
            ("actions platter=0..1", 1),
            ("sample =", 1),
        ];

        for (text, expected_line) in cases {
            match Routine::parse(text) {
                Err(AutomationError::Parse { line, .. }) => {
                    assert_eq!(line, expected_line, "wrong line for {text:?}")
                }
                other => panic!("expected parse error for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_durations() {
        let routine = Routine::default();
        assert!((routine.beat_duration() - 0.6).abs() < EPS);
        assert!((routine.platter_revolution_duration() - 60.0 / 33.0).abs() < EPS);
    }

    #[test]
    fn test_all_presets_build_sequencers() {
        for name in Routine::preset_names() {
            let routine = Routine::preset(name).unwrap();
            let seq = routine.sequencer().unwrap();
            assert!(seq.total_duration() > 0.0, "{name} has no length");
            // Every preset returns the platter to where it started
            let end = seq.platter_position_seconds_at(seq.total_duration());
            assert!(end.abs() < EPS, "{name} ends at {end}");
        }
        assert!(Routine::preset("wiggle").is_none());
    }

    #[test]
    fn test_baby_preset_timing() {
        let seq = Routine::preset("Baby").unwrap().sequencer().unwrap();
        assert!((seq.total_duration() - 1.2).abs() < EPS);
        let peak = seq.platter_position_seconds_at(0.6);
        assert!((peak - 0.125 * 60.0 / 33.0).abs() < EPS);
    }

    #[test]
    fn test_empty_routine_fails_in_sequencer() {
        let routine = Routine::parse("bpm = 120").unwrap();
        assert_eq!(routine.sequencer().err(), Some(AutomationError::EmptyActions));
    }
}
