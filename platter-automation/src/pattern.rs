//! Micro-pattern fader envelopes
//!
//! A pattern is a compact string where `_` is fader closed (gain 0) and `-`
//! is fader open (gain 1). Characters are spread evenly over the envelope
//! range, so `"_-_-"` over `[0, 1]` becomes a sawtooth with keyframes at
//! thirds.

use crate::easing::Curve;
use crate::envelope::{Envelope, Keyframe};
use crate::error::AutomationError;

const CLOSED: char = '_';
const OPEN: char = '-';

fn gain_for(c: char, pattern: &str) -> Result<f64, AutomationError> {
    match c {
        CLOSED => Ok(0.0),
        OPEN => Ok(1.0),
        _ => Err(AutomationError::InvalidPatternCharacter {
            pattern: pattern.to_string(),
        }),
    }
}

/// Convert a pattern into keyframes over `[0, range_max]`
///
/// A single character holds its value across the whole range. An empty
/// pattern has no keyframes and fails with `TooFewKeyframes`.
pub fn keyframes_from_pattern(
    pattern: &str,
    range_max: f64,
) -> Result<Vec<Keyframe>, AutomationError> {
    let chars: Vec<char> = pattern.chars().collect();

    match chars.len() {
        0 => Err(AutomationError::TooFewKeyframes { count: 0 }),
        1 => {
            let value = gain_for(chars[0], pattern)?;
            Ok(vec![Keyframe::new(0.0, value), Keyframe::new(range_max, value)])
        }
        len => {
            let last = (len - 1) as f64;
            chars
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    let value = gain_for(c, pattern)?;
                    Ok(Keyframe::new(i as f64 / last * range_max, value))
                })
                .collect()
        }
    }
}

impl Envelope {
    /// Build a fader envelope from a micro-pattern, `curve` on every segment
    pub fn from_pattern(
        range_max: f64,
        pattern: &str,
        curve: Curve,
    ) -> Result<Self, AutomationError> {
        let keyframes = keyframes_from_pattern(pattern, range_max)?;
        Envelope::with_curve(keyframes, curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn assert_keyframes(actual: &[Keyframe], expected: &[(f64, f64)]) {
        assert_eq!(actual.len(), expected.len());
        for (kf, &(pos, value)) in actual.iter().zip(expected) {
            assert!((kf.pos - pos).abs() < EPS, "pos {} != {}", kf.pos, pos);
            assert_eq!(kf.value, value);
        }
    }

    #[test]
    fn test_alternating_pattern() {
        let kfs = keyframes_from_pattern("_-_-", 1.0).unwrap();
        assert_keyframes(
            &kfs,
            &[(0.0, 0.0), (1.0 / 3.0, 1.0), (2.0 / 3.0, 0.0), (1.0, 1.0)],
        );
    }

    #[test]
    fn test_flat_patterns() {
        let closed = keyframes_from_pattern("__", 1.0).unwrap();
        assert_keyframes(&closed, &[(0.0, 0.0), (1.0, 0.0)]);

        let open = keyframes_from_pattern("--", 1.0).unwrap();
        assert_keyframes(&open, &[(0.0, 1.0), (1.0, 1.0)]);
    }

    #[test]
    fn test_range_scales_positions() {
        let kfs = keyframes_from_pattern("_-_", 2.0).unwrap();
        assert_keyframes(&kfs, &[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
    }

    #[test]
    fn test_single_character_spans_range() {
        let kfs = keyframes_from_pattern("-", 4.0).unwrap();
        assert_keyframes(&kfs, &[(0.0, 1.0), (4.0, 1.0)]);

        let kfs = keyframes_from_pattern("_", 1.0).unwrap();
        assert_keyframes(&kfs, &[(0.0, 0.0), (1.0, 0.0)]);
    }

    #[test]
    fn test_invalid_characters() {
        for pattern in ["x", "_-x-", "_ -"] {
            assert_eq!(
                keyframes_from_pattern(pattern, 1.0),
                Err(AutomationError::InvalidPatternCharacter {
                    pattern: pattern.to_string()
                })
            );
        }
        assert_eq!(
            keyframes_from_pattern("", 1.0),
            Err(AutomationError::TooFewKeyframes { count: 0 })
        );
    }

    #[test]
    fn test_envelope_from_pattern() {
        let env = Envelope::from_pattern(1.0, "-__-", Curve::OutExpo).unwrap();
        assert_eq!(env.num_intervals(), 3);
        assert!(env.curves().iter().all(|c| *c == Curve::OutExpo));
        assert_eq!(env.value_at(0.0), 1.0);
        assert_eq!(env.value_at(0.5), 0.0);
        assert_eq!(env.value_at(1.0), 1.0);
    }
}
