//! Easing curves - normalized `[0, 1] -> [0, 1]` shaping functions
//!
//! Two layers:
//! - [`Curve`]: the full Penner catalogue (quad, cubic, quart, quint, sine,
//!   expo, circ, elastic, back, bounce) plus hard square steps.
//! - [`Easing`]: the named hand/platter motions a routine is written in
//!   ("smooth", "sharp", "motor start", ...), each mapped onto one curve.

use crate::error::AutomationError;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// A stateless easing curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Curve {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    InSine,
    OutSine,
    InOutSine,
    InExpo,
    OutExpo,
    InOutExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    InElastic,
    OutElastic,
    InOutElastic,
    InBack,
    OutBack,
    InOutBack,
    InBounce,
    OutBounce,
    InOutBounce,
    InSquare,
    OutSquare,
    InOutSquare,
}

impl Curve {
    /// Every curve, in catalogue order
    pub const ALL: [Curve; 34] = [
        Curve::Linear,
        Curve::InQuad,
        Curve::OutQuad,
        Curve::InOutQuad,
        Curve::InCubic,
        Curve::OutCubic,
        Curve::InOutCubic,
        Curve::InQuart,
        Curve::OutQuart,
        Curve::InOutQuart,
        Curve::InQuint,
        Curve::OutQuint,
        Curve::InOutQuint,
        Curve::InSine,
        Curve::OutSine,
        Curve::InOutSine,
        Curve::InExpo,
        Curve::OutExpo,
        Curve::InOutExpo,
        Curve::InCirc,
        Curve::OutCirc,
        Curve::InOutCirc,
        Curve::InElastic,
        Curve::OutElastic,
        Curve::InOutElastic,
        Curve::InBack,
        Curve::OutBack,
        Curve::InOutBack,
        Curve::InBounce,
        Curve::OutBounce,
        Curve::InOutBounce,
        Curve::InSquare,
        Curve::OutSquare,
        Curve::InOutSquare,
    ];

    /// Overshoot constant for the back curves
    const BACK_C1: f64 = 1.70158;

    /// Evaluate the curve at `t` (expected in `[0, 1]`)
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Curve::Linear => t,

            Curve::InQuad => t * t,
            Curve::OutQuad => 1.0 - (1.0 - t).powi(2),
            Curve::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }

            Curve::InCubic => t.powi(3),
            Curve::OutCubic => 1.0 - (1.0 - t).powi(3),
            Curve::InOutCubic => {
                if t < 0.5 {
                    4.0 * t.powi(3)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }

            Curve::InQuart => t.powi(4),
            Curve::OutQuart => 1.0 - (1.0 - t).powi(4),
            Curve::InOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }

            Curve::InQuint => t.powi(5),
            Curve::OutQuint => 1.0 - (1.0 - t).powi(5),
            Curve::InOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }

            Curve::InSine => 1.0 - (t * PI / 2.0).cos(),
            Curve::OutSine => (t * PI / 2.0).sin(),
            Curve::InOutSine => -((PI * t).cos() - 1.0) / 2.0,

            Curve::InExpo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * t - 10.0)
                }
            }
            Curve::OutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Curve::InOutExpo => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }

            Curve::InCirc => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Curve::OutCirc => (1.0 - (t - 1.0).powi(2)).max(0.0).sqrt(),
            Curve::InOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).max(0.0).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
                }
            }

            Curve::InElastic => {
                let c4 = (2.0 * PI) / 3.0;
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * c4).sin()
                }
            }
            Curve::OutElastic => {
                let c4 = (2.0 * PI) / 3.0;
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Curve::InOutElastic => {
                let c5 = (2.0 * PI) / 4.5;
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    -(2f64.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * c5).sin()) / 2.0
                } else {
                    (2f64.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * c5).sin()) / 2.0 + 1.0
                }
            }

            Curve::InBack => {
                let c3 = Self::BACK_C1 + 1.0;
                c3 * t.powi(3) - Self::BACK_C1 * t * t
            }
            Curve::OutBack => {
                let c3 = Self::BACK_C1 + 1.0;
                1.0 + c3 * (t - 1.0).powi(3) + Self::BACK_C1 * (t - 1.0).powi(2)
            }
            Curve::InOutBack => {
                let c2 = Self::BACK_C1 * 1.525;
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((c2 + 1.0) * 2.0 * t - c2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((c2 + 1.0) * (t * 2.0 - 2.0) + c2) + 2.0) / 2.0
                }
            }

            Curve::InBounce => 1.0 - out_bounce(1.0 - t),
            Curve::OutBounce => out_bounce(t),
            Curve::InOutBounce => {
                if t < 0.5 {
                    (1.0 - out_bounce(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + out_bounce(2.0 * t - 1.0)) / 2.0
                }
            }

            // Hard steps: instantaneous switch at the start, middle or end
            Curve::InSquare => {
                if t < 1.0 {
                    0.0
                } else {
                    1.0
                }
            }
            Curve::OutSquare => {
                if t > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Curve::InOutSquare => {
                if t < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// Catalogue name (e.g. "InOutSine")
    pub fn name(self) -> &'static str {
        match self {
            Curve::Linear => "Linear",
            Curve::InQuad => "InQuad",
            Curve::OutQuad => "OutQuad",
            Curve::InOutQuad => "InOutQuad",
            Curve::InCubic => "InCubic",
            Curve::OutCubic => "OutCubic",
            Curve::InOutCubic => "InOutCubic",
            Curve::InQuart => "InQuart",
            Curve::OutQuart => "OutQuart",
            Curve::InOutQuart => "InOutQuart",
            Curve::InQuint => "InQuint",
            Curve::OutQuint => "OutQuint",
            Curve::InOutQuint => "InOutQuint",
            Curve::InSine => "InSine",
            Curve::OutSine => "OutSine",
            Curve::InOutSine => "InOutSine",
            Curve::InExpo => "InExpo",
            Curve::OutExpo => "OutExpo",
            Curve::InOutExpo => "InOutExpo",
            Curve::InCirc => "InCirc",
            Curve::OutCirc => "OutCirc",
            Curve::InOutCirc => "InOutCirc",
            Curve::InElastic => "InElastic",
            Curve::OutElastic => "OutElastic",
            Curve::InOutElastic => "InOutElastic",
            Curve::InBack => "InBack",
            Curve::OutBack => "OutBack",
            Curve::InOutBack => "InOutBack",
            Curve::InBounce => "InBounce",
            Curve::OutBounce => "OutBounce",
            Curve::InOutBounce => "InOutBounce",
            Curve::InSquare => "InSquare",
            Curve::OutSquare => "OutSquare",
            Curve::InOutSquare => "InOutSquare",
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Curve {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Curve::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| AutomationError::UnknownEasing(s.to_string()))
    }
}

#[inline]
fn out_bounce(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// Named platter motion used by scratch actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Easing {
    /// Robotic movement (slow drags, transformer)
    #[default]
    Linear,
    /// Natural hand motion (baby scratch)
    Smooth,
    /// Aggressive acceleration (chirps, stabs)
    Sharp,
    /// Heavy hand, high resistance
    Heavy,
    /// Hand lets go and the motor takes over
    MotorStart,
    /// Throw backwards
    Spinback,
    /// Stop button, platter winds down
    PowerDown,
    Bounce,
    Elastic,
}

impl Easing {
    pub const ALL: [Easing; 9] = [
        Easing::Linear,
        Easing::Smooth,
        Easing::Sharp,
        Easing::Heavy,
        Easing::MotorStart,
        Easing::Spinback,
        Easing::PowerDown,
        Easing::Bounce,
        Easing::Elastic,
    ];

    /// Curve this motion is shaped by
    pub fn curve(self) -> Curve {
        match self {
            Easing::Linear => Curve::Linear,
            Easing::Smooth => Curve::InOutSine,
            Easing::Sharp => Curve::InOutCubic,
            Easing::Heavy => Curve::InOutQuint,
            Easing::MotorStart => Curve::OutExpo,
            Easing::Spinback => Curve::OutCubic,
            Easing::PowerDown => Curve::OutQuad,
            Easing::Bounce => Curve::OutBounce,
            Easing::Elastic => Curve::OutElastic,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::Smooth => "smooth",
            Easing::Sharp => "sharp",
            Easing::Heavy => "heavy",
            Easing::MotorStart => "motor-start",
            Easing::Spinback => "spinback",
            Easing::PowerDown => "power-down",
            Easing::Bounce => "bounce",
            Easing::Elastic => "elastic",
        }
    }

    /// Routine shorthand symbol, if the easing has one
    pub fn symbol(self) -> Option<char> {
        match self {
            Easing::Linear => Some('-'),
            Easing::Smooth => Some('~'),
            Easing::Sharp => Some('^'),
            Easing::MotorStart => Some('>'),
            _ => None,
        }
    }
}

impl From<Easing> for Curve {
    fn from(easing: Easing) -> Self {
        easing.curve()
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Easing {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let normalized = s.to_ascii_lowercase().replace('_', "-");

        Easing::ALL
            .iter()
            .copied()
            .find(|e| {
                e.name() == normalized
                    || e.name().replace('-', "") == normalized
                    || e.symbol().map(String::from).as_deref() == Some(s)
            })
            .ok_or_else(|| AutomationError::UnknownEasing(s.to_string()))
    }
}
