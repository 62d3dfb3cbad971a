//! Scratch action - one platter move paired with one fader gesture

use crate::easing::Easing;
use crate::envelope::{Envelope, Keyframe};
use crate::error::AutomationError;
use crate::gesture::Gesture;
use std::sync::OnceLock;

/// Crossfader behaviour for an action
#[derive(Debug, Clone, PartialEq)]
pub enum Fader {
    /// One of the built-in gesture templates
    Gesture(Gesture),
    /// Custom gain envelope over normalized progress `[0, 1]`
    Envelope(Envelope),
}

impl Default for Fader {
    fn default() -> Self {
        Fader::Gesture(Gesture::Open)
    }
}

impl From<Gesture> for Fader {
    fn from(gesture: Gesture) -> Self {
        Fader::Gesture(gesture)
    }
}

impl From<Envelope> for Fader {
    fn from(envelope: Envelope) -> Self {
        Fader::Envelope(envelope)
    }
}

/// One scratch gesture
///
/// The platter moves from `platter_start` to `platter_end` revolutions over
/// `duration_in_beats`, shaped by `easing`, while the fader follows `fader`.
/// The derived platter envelope is built on first use and cached, so the
/// action is only changed through the consuming `with_*` builders.
#[derive(Debug, Default)]
pub struct ScratchAction {
    /// Starting platter position in revolutions
    platter_start: f64,
    /// Ending platter position in revolutions
    platter_end: f64,
    /// Length of the action in beats
    duration_in_beats: f64,
    easing: Easing,
    fader: Fader,
    /// Explicit platter envelope (beats -> revolutions), replaces the
    /// start/end/easing motion when set
    platter_override: Option<Envelope>,
    platter_cache: OnceLock<Result<Envelope, AutomationError>>,
}

impl Clone for ScratchAction {
    fn clone(&self) -> Self {
        // The cache is derived state; a clone rebuilds it on demand
        Self {
            platter_start: self.platter_start,
            platter_end: self.platter_end,
            duration_in_beats: self.duration_in_beats,
            easing: self.easing,
            fader: self.fader.clone(),
            platter_override: self.platter_override.clone(),
            platter_cache: OnceLock::new(),
        }
    }
}

impl PartialEq for ScratchAction {
    fn eq(&self, other: &Self) -> bool {
        self.platter_start == other.platter_start
            && self.platter_end == other.platter_end
            && self.duration_in_beats == other.duration_in_beats
            && self.easing == other.easing
            && self.fader == other.fader
            && self.platter_override == other.platter_override
    }
}

impl ScratchAction {
    /// Linear, fader-open move from `start` to `end` revolutions
    pub fn new(platter_start: f64, platter_end: f64, duration_in_beats: f64) -> Self {
        Self {
            platter_start,
            platter_end,
            duration_in_beats,
            ..Default::default()
        }
    }

    /// Hold the platter still for `duration_in_beats`
    pub fn hold(position: f64, duration_in_beats: f64) -> Self {
        Self::new(position, position, duration_in_beats)
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self.platter_cache = OnceLock::new();
        self
    }

    pub fn with_gesture(mut self, gesture: Gesture) -> Self {
        self.fader = Fader::Gesture(gesture);
        self
    }

    pub fn with_fader_envelope(mut self, envelope: Envelope) -> Self {
        self.fader = Fader::Envelope(envelope);
        self
    }

    /// Drive the platter from an explicit envelope over beats
    ///
    /// The action lasts until the envelope's last keyframe.
    pub fn with_platter_envelope(mut self, envelope: Envelope) -> Self {
        self.duration_in_beats = envelope.last().pos;
        self.platter_start = envelope.first().value;
        self.platter_end = envelope.last().value;
        self.platter_override = Some(envelope);
        self.platter_cache = OnceLock::new();
        self
    }

    pub fn platter_start(&self) -> f64 {
        self.platter_start
    }

    pub fn platter_end(&self) -> f64 {
        self.platter_end
    }

    pub fn duration_in_beats(&self) -> f64 {
        self.duration_in_beats
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn fader(&self) -> &Fader {
        &self.fader
    }

    pub fn platter_override(&self) -> Option<&Envelope> {
        self.platter_override.as_ref()
    }

    /// Platter envelope: beats -> revolutions
    ///
    /// Returns the override if one was supplied, otherwise the two-keyframe
    /// motion `(0, start) -> (duration, end)`, built once and memoized. A
    /// non-positive duration fails on the first call and on every call
    /// after it.
    pub fn platter_envelope(&self) -> Result<&Envelope, AutomationError> {
        if let Some(envelope) = &self.platter_override {
            return Ok(envelope);
        }

        self.platter_cache
            .get_or_init(|| self.build_platter_envelope())
            .as_ref()
            .map_err(AutomationError::clone)
    }

    /// Fader envelope: progress `[0, 1]` -> gain
    pub fn fader_envelope(&self) -> &Envelope {
        match &self.fader {
            Fader::Gesture(gesture) => gesture.envelope(),
            Fader::Envelope(envelope) => envelope,
        }
    }

    fn build_platter_envelope(&self) -> Result<Envelope, AutomationError> {
        if !(self.duration_in_beats.is_finite() && self.duration_in_beats > 0.0) {
            return Err(AutomationError::NonPositiveActionDuration {
                duration: self.duration_in_beats,
            });
        }

        Envelope::with_curve(
            vec![
                Keyframe::new(0.0, self.platter_start),
                Keyframe::new(self.duration_in_beats, self.platter_end),
            ],
            self.easing.curve(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Curve;
    use crate::envelope::EnvelopeBuilder;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_platter_envelope_endpoints() {
        let action = ScratchAction::new(0.0, 0.125, 1.0).with_easing(Easing::Smooth);
        let env = action.platter_envelope().unwrap();
        assert!(env.value_at(0.0).abs() < EPS);
        assert!((env.value_at(1.0) - 0.125).abs() < EPS);
        assert_eq!(env.curves(), &[Curve::InOutSine]);
    }

    #[test]
    fn test_platter_envelope_is_memoized() {
        let action = ScratchAction::new(0.0, 1.0, 2.0);
        let first = action.platter_envelope().unwrap() as *const Envelope;
        let second = action.platter_envelope().unwrap() as *const Envelope;
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_positive_duration_errors_every_call() {
        for duration in [0.0, -1.0, f64::NAN] {
            let action = ScratchAction::new(0.0, 1.0, duration);
            assert!(matches!(
                action.platter_envelope(),
                Err(AutomationError::NonPositiveActionDuration { .. })
            ));
            assert!(action.platter_envelope().is_err());
        }
    }

    #[test]
    fn test_platter_override_wins() {
        let env = EnvelopeBuilder::from(0.0, 0.0)
            .to(Curve::InSine, 0.25, 0.2)
            .and_then(|b| b.to(Curve::InOutSine, 0.5, 0.1))
            .and_then(|b| b.build())
            .unwrap();
        let action = ScratchAction::default().with_platter_envelope(env.clone());

        assert_eq!(action.duration_in_beats(), 0.5);
        assert_eq!(action.platter_envelope().unwrap(), &env);
    }

    #[test]
    fn test_fader_template_and_override() {
        let action = ScratchAction::new(0.0, 1.0, 1.0).with_gesture(Gesture::Cut);
        assert!(std::ptr::eq(action.fader_envelope(), Gesture::Cut.envelope()));

        let custom = Envelope::linear(vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 0.5)]).unwrap();
        let action = action.with_fader_envelope(custom.clone());
        assert_eq!(action.fader_envelope(), &custom);
    }

    #[test]
    fn test_clone_rebuilds_cache() {
        let action = ScratchAction::new(0.0, 1.0, 1.0).with_easing(Easing::Sharp);
        let _ = action.platter_envelope();
        let copy = action.clone();
        assert_eq!(copy, action);
        assert_eq!(
            copy.platter_envelope().unwrap(),
            action.platter_envelope().unwrap()
        );
    }
}
