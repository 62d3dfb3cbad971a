//! Sequencer - turns a list of scratch actions into a function of real time
//!
//! Three clocks meet here:
//! - beats (action durations, platter envelope positions)
//! - platter revolutions (platter envelope values)
//! - seconds (the performance clock the audio engine runs on)
//!
//! The sequencer lays the actions end to end in seconds using the beat
//! duration, and converts platter revolutions back into seconds of source
//! audio using the platter revolution duration.

use crate::action::ScratchAction;
use crate::error::AutomationError;
use tracing::debug;

/// An action placed on the performance timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimedAction {
    pub action: ScratchAction,
    /// Start time in seconds
    pub start_time: f64,
    /// End time in seconds
    pub end_time: f64,
}

impl TimedAction {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Result of resolving a time to an action
#[derive(Debug, Clone, Copy)]
pub struct Location<'a> {
    /// Index of the action in the sequence
    pub index: usize,
    pub timed: &'a TimedAction,
    /// Linear progress through the action (0.0 - 1.0)
    pub progress: f64,
    /// False when the time was before the start or after the end
    pub in_range: bool,
}

/// Immutable timeline of scratch actions
#[derive(Debug, Clone)]
pub struct Sequencer {
    timed: Vec<TimedAction>,
    beat_duration: f64,
    platter_revolution_duration: f64,
}

impl Sequencer {
    /// Build a sequencer
    ///
    /// `platter_revolution_duration` is the length of one platter revolution
    /// in seconds (`60 / rpm`), `beat_duration` the length of one beat in
    /// seconds (`60 / bpm`). Every action must have a positive duration and a
    /// buildable platter envelope.
    pub fn new(
        actions: Vec<ScratchAction>,
        platter_revolution_duration: f64,
        beat_duration: f64,
    ) -> Result<Self, AutomationError> {
        if actions.is_empty() {
            return Err(AutomationError::EmptyActions);
        }
        if beat_duration.is_nan() || beat_duration <= 0.0 {
            return Err(AutomationError::NonPositiveBeatDuration);
        }
        if platter_revolution_duration.is_nan() || platter_revolution_duration <= 0.0 {
            return Err(AutomationError::NonPositivePlatterDuration);
        }

        for (index, action) in actions.iter().enumerate() {
            Self::validate(action).map_err(|source| AutomationError::InvalidAction {
                index,
                source: Box::new(source),
            })?;
        }

        let mut current_time = 0.0;
        let timed: Vec<TimedAction> = actions
            .into_iter()
            .map(|action| {
                let start_time = current_time;
                let end_time = current_time + beat_duration * action.duration_in_beats();
                current_time = end_time;
                TimedAction {
                    action,
                    start_time,
                    end_time,
                }
            })
            .collect();

        debug!(
            actions = timed.len(),
            total_secs = current_time,
            beat_duration,
            platter_revolution_duration,
            "sequencer initialized"
        );

        Ok(Self {
            timed,
            beat_duration,
            platter_revolution_duration,
        })
    }

    /// Build a sequencer from tempo (beats per minute) and platter speed
    /// (revolutions per minute)
    pub fn from_bpm_rpm(
        actions: Vec<ScratchAction>,
        bpm: f64,
        rpm: f64,
    ) -> Result<Self, AutomationError> {
        if bpm.is_nan() || bpm <= 0.0 {
            return Err(AutomationError::NonPositiveBeatDuration);
        }
        if rpm.is_nan() || rpm <= 0.0 {
            return Err(AutomationError::NonPositivePlatterDuration);
        }
        Self::new(actions, 60.0 / rpm, 60.0 / bpm)
    }

    fn validate(action: &ScratchAction) -> Result<(), AutomationError> {
        let duration = action.duration_in_beats();
        if !(duration.is_finite() && duration > 0.0) {
            return Err(AutomationError::NonPositiveActionDuration { duration });
        }
        action.platter_envelope().map(|_| ())
    }

    /// Length of one beat in seconds
    pub fn beat_duration(&self) -> f64 {
        self.beat_duration
    }

    /// Length of one platter revolution in seconds
    pub fn platter_revolution_duration(&self) -> f64 {
        self.platter_revolution_duration
    }

    pub fn timed_actions(&self) -> &[TimedAction] {
        &self.timed
    }

    pub fn actions(&self) -> impl Iterator<Item = &ScratchAction> {
        self.timed.iter().map(|t| &t.action)
    }

    pub fn len(&self) -> usize {
        self.timed.len()
    }

    /// Always false: construction rejects an empty action list
    pub fn is_empty(&self) -> bool {
        self.timed.is_empty()
    }

    /// End time of the last action in seconds
    pub fn total_duration(&self) -> f64 {
        self.timed[self.timed.len() - 1].end_time
    }

    /// Resolve the action playing at `time` (seconds)
    ///
    /// Scans in order and returns the first action whose closed interval
    /// contains `time`, so a boundary shared by two actions resolves to the
    /// earlier one with progress 1.0. Before the start the first action is
    /// returned with progress 0; past the end (or for NaN) the last action
    /// with progress 1.
    pub fn locate(&self, time: f64) -> Location<'_> {
        if time < 0.0 {
            return Location {
                index: 0,
                timed: &self.timed[0],
                progress: 0.0,
                in_range: false,
            };
        }

        for (index, timed) in self.timed.iter().enumerate() {
            if timed.start_time <= time && time <= timed.end_time {
                return Location {
                    index,
                    timed,
                    progress: (time - timed.start_time) / timed.duration(),
                    in_range: true,
                };
            }
        }

        let index = self.timed.len() - 1;
        Location {
            index,
            timed: &self.timed[index],
            progress: 1.0,
            in_range: false,
        }
    }

    /// Crossfader gain at `time`
    pub fn gain_at(&self, time: f64) -> f64 {
        let location = self.locate(time);
        location
            .timed
            .action
            .fader_envelope()
            .value_at(location.progress)
    }

    /// Platter position at `time`, expressed as seconds of source audio
    pub fn platter_position_seconds_at(&self, time: f64) -> f64 {
        let location = self.locate(time);
        let action = &location.timed.action;
        let beat = location.progress * action.duration_in_beats();

        // Envelopes were validated in `new`, the fallback is never taken
        let revolutions = action
            .platter_envelope()
            .map(|envelope| envelope.value_at(beat))
            .unwrap_or(action.platter_start());

        revolutions * self.platter_revolution_duration
    }

    /// Head position (seconds of source audio) and gain at `time`
    pub fn position_and_gain_at(&self, time: f64) -> (f64, f64) {
        (
            self.platter_position_seconds_at(time),
            self.gain_at(time),
        )
    }
}
