//! Keyframe envelopes - piecewise eased interpolation
//!
//! An [`Envelope`] is a sorted list of keyframes with one easing curve per
//! adjacent pair. The position axis is whatever the owner needs: beats for
//! platter motion, normalized progress for fader gestures.

use crate::easing::Curve;
use crate::error::AutomationError;

/// A point on an envelope
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keyframe {
    pub pos: f64,
    pub value: f64,
}

impl Keyframe {
    pub const fn new(pos: f64, value: f64) -> Self {
        Self { pos, value }
    }
}

impl From<(f64, f64)> for Keyframe {
    fn from((pos, value): (f64, f64)) -> Self {
        Self { pos, value }
    }
}

/// Immutable piecewise eased function over keyframes
///
/// Invariant: `keyframes.len() >= 2` and `curves.len() == keyframes.len() - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    keyframes: Vec<Keyframe>,
    curves: Vec<Curve>,
}

impl Envelope {
    /// Build an envelope from keyframes and per-interval curves
    ///
    /// Keyframes are sorted by position (stable, so keyframes sharing a
    /// position keep the order they were given in). Missing curves default
    /// to linear and extra curves are ignored.
    pub fn new(mut keyframes: Vec<Keyframe>, curves: &[Curve]) -> Result<Self, AutomationError> {
        if keyframes.len() < 2 {
            return Err(AutomationError::TooFewKeyframes {
                count: keyframes.len(),
            });
        }

        keyframes.sort_by(|a, b| a.pos.total_cmp(&b.pos));

        let num_intervals = keyframes.len() - 1;
        let curves = (0..num_intervals)
            .map(|i| curves.get(i).copied().unwrap_or_default())
            .collect();

        Ok(Self { keyframes, curves })
    }

    /// Build an envelope that uses one curve for every interval
    pub fn with_curve(keyframes: Vec<Keyframe>, curve: Curve) -> Result<Self, AutomationError> {
        let curves = vec![curve; keyframes.len().saturating_sub(1)];
        Self::new(keyframes, &curves)
    }

    /// Build a linear envelope
    pub fn linear(keyframes: Vec<Keyframe>) -> Result<Self, AutomationError> {
        Self::new(keyframes, &[])
    }

    /// Build from a literal `(pos, value)` table
    ///
    /// Only used for the built-in gesture tables, which always hold at
    /// least two rows.
    pub(crate) fn from_table(table: &[(f64, f64)], curve: Curve) -> Self {
        debug_assert!(table.len() >= 2);
        let mut keyframes: Vec<Keyframe> = table.iter().copied().map(Keyframe::from).collect();
        keyframes.sort_by(|a, b| a.pos.total_cmp(&b.pos));
        let curves = vec![curve; keyframes.len().saturating_sub(1)];
        Self { keyframes, curves }
    }

    /// Value at `pos`
    ///
    /// The first interval containing `pos` (both ends inclusive) wins. A
    /// zero-width interval is an instantaneous step and yields its end
    /// value. Positions outside every interval, on either side, yield the
    /// last keyframe's value.
    pub fn value_at(&self, pos: f64) -> f64 {
        for (i, pair) in self.keyframes.windows(2).enumerate() {
            let (start, end) = (pair[0], pair[1]);

            if pos >= start.pos && pos <= end.pos {
                let width = end.pos - start.pos;
                if width == 0.0 {
                    return end.value;
                }

                let t = (pos - start.pos) / width;
                return start.value + (end.value - start.value) * self.curves[i].apply(t);
            }
        }

        self.last().value
    }

    /// Copy of the keyframes, sorted by position
    pub fn keyframes(&self) -> Vec<Keyframe> {
        self.keyframes.clone()
    }

    /// Curves, one per interval
    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    pub fn num_intervals(&self) -> usize {
        self.keyframes.len() - 1
    }

    pub fn first(&self) -> Keyframe {
        self.keyframes[0]
    }

    pub fn last(&self) -> Keyframe {
        self.keyframes[self.keyframes.len() - 1]
    }

    /// Split keyframes into parallel position and value columns
    pub fn unzip(&self) -> (Vec<f64>, Vec<f64>) {
        self.keyframes.iter().map(|k| (k.pos, k.value)).unzip()
    }
}

/// Incremental envelope construction with strictly increasing positions
///
/// ```
/// use platter_automation::{Curve, EnvelopeBuilder};
///
/// let env = EnvelopeBuilder::from(0.0, 0.0)
///     .to(Curve::InSine, 0.25, 0.2)?
///     .to(Curve::InOutSine, 0.5, 0.1)?
///     .build()?;
/// assert_eq!(env.num_intervals(), 2);
/// # Ok::<(), platter_automation::AutomationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    keyframes: Vec<Keyframe>,
    curves: Vec<Curve>,
}

impl EnvelopeBuilder {
    /// Start at the given keyframe
    pub fn from(pos: f64, value: f64) -> Self {
        Self {
            keyframes: vec![Keyframe::new(pos, value)],
            curves: Vec::new(),
        }
    }

    /// Append a keyframe reached through `curve`
    pub fn to(mut self, curve: Curve, pos: f64, value: f64) -> Result<Self, AutomationError> {
        let last = self.keyframes[self.keyframes.len() - 1].pos;
        if pos <= last || !pos.is_finite() {
            return Err(AutomationError::NonIncreasingKeyframe { last, pos });
        }

        self.keyframes.push(Keyframe::new(pos, value));
        self.curves.push(curve);
        Ok(self)
    }

    pub fn build(self) -> Result<Envelope, AutomationError> {
        Envelope::new(self.keyframes, &self.curves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn kf(pos: f64, value: f64) -> Keyframe {
        Keyframe::new(pos, value)
    }

    #[test]
    fn test_requires_two_keyframes() {
        assert_eq!(
            Envelope::linear(vec![kf(0.0, 1.0)]),
            Err(AutomationError::TooFewKeyframes { count: 1 })
        );
        assert_eq!(
            Envelope::linear(Vec::new()),
            Err(AutomationError::TooFewKeyframes { count: 0 })
        );
    }

    #[test]
    fn test_endpoints_and_monotonic_between() {
        let env = Envelope::with_curve(vec![kf(0.0, 2.0), kf(1.0, 5.0)], Curve::InOutSine).unwrap();
        assert!((env.value_at(0.0) - 2.0).abs() < EPS);
        assert!((env.value_at(1.0) - 5.0).abs() < EPS);

        let mut prev = env.value_at(0.0);
        for i in 1..=50 {
            let v = env.value_at(i as f64 / 50.0);
            assert!(v >= prev);
            assert!((2.0..=5.0).contains(&v));
            prev = v;
        }
    }

    #[test]
    fn test_sorts_keyframes() {
        let env = Envelope::linear(vec![kf(1.0, 10.0), kf(0.0, 0.0), kf(0.5, 5.0)]).unwrap();
        let positions: Vec<f64> = env.keyframes().iter().map(|k| k.pos).collect();
        assert_eq!(positions, vec![0.0, 0.5, 1.0]);
        assert!((env.value_at(0.25) - 2.5).abs() < EPS);
    }

    #[test]
    fn test_curves_padded_and_truncated() {
        let padded = Envelope::new(
            vec![kf(0.0, 0.0), kf(1.0, 1.0), kf(2.0, 0.0)],
            &[Curve::InQuad],
        )
        .unwrap();
        assert_eq!(padded.curves(), &[Curve::InQuad, Curve::Linear]);

        let truncated = Envelope::new(
            vec![kf(0.0, 0.0), kf(1.0, 1.0)],
            &[Curve::OutQuad, Curve::InQuad, Curve::InCubic],
        )
        .unwrap();
        assert_eq!(truncated.curves(), &[Curve::OutQuad]);
        assert_eq!(truncated.num_intervals(), 1);
    }

    #[test]
    fn test_zero_width_interval_is_step() {
        let env = Envelope::linear(vec![
            kf(0.0, 1.0),
            kf(0.5, 1.0),
            kf(0.5, 0.0),
            kf(1.0, 0.0),
        ])
        .unwrap();
        // [0, 0.5] contains 0.5 first, so the step is only seen through
        // a zero-width interval when it is the first match
        assert_eq!(env.value_at(0.5), 1.0);

        let step = Envelope::linear(vec![kf(0.5, 0.2), kf(0.5, 0.9), kf(1.0, 0.9)]).unwrap();
        assert_eq!(step.value_at(0.5), 0.9);
    }

    #[test]
    fn test_out_of_domain_returns_last_value() {
        let env = Envelope::linear(vec![kf(0.0, 3.0), kf(1.0, 7.0)]).unwrap();
        assert_eq!(env.value_at(1.5), 7.0);
        assert_eq!(env.value_at(100.0), 7.0);
        // Below the first keyframe is not clamped to the first value
        assert_eq!(env.value_at(-0.1), 7.0);
    }

    #[test]
    fn test_unzip() {
        let env = Envelope::linear(vec![kf(0.0, 1.0), kf(2.0, 3.0)]).unwrap();
        let (positions, values) = env.unzip();
        assert_eq!(positions, vec![0.0, 2.0]);
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[test]
    fn test_builder_rejects_non_increasing() {
        let result = EnvelopeBuilder::from(0.0, 0.0)
            .to(Curve::Linear, 0.5, 1.0)
            .and_then(|b| b.to(Curve::Linear, 0.5, 0.0));
        assert_eq!(
            result.err(),
            Some(AutomationError::NonIncreasingKeyframe { last: 0.5, pos: 0.5 })
        );
    }

    #[test]
    fn test_builder_single_keyframe_fails_on_build() {
        assert_eq!(
            EnvelopeBuilder::from(0.0, 1.0).build(),
            Err(AutomationError::TooFewKeyframes { count: 1 })
        );
    }
}
