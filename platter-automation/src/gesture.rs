//! Crossfader gesture templates
//!
//! Each gesture is a fixed gain envelope over normalized action progress
//! (`0.0` = action start, `1.0` = action end). All segments use a quintic
//! in-out curve so cuts are fast but never a hard discontinuity.

use crate::easing::Curve;
use crate::envelope::Envelope;
use crate::error::AutomationError;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Named crossfader gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gesture {
    /// Fader open for the whole action (baby scratch, drags, releases)
    #[default]
    Open,
    /// Fader closed for the whole action (pauses, ghost moves)
    Closed,
    /// Open, then snapped shut just before the end to hide the turnaround
    Cut,
    /// On/off/on/off at 50% duty cycle
    Transform,
    /// One click in the middle: two sounds from one movement
    Flare1,
    /// Two clicks: three sounds from one movement
    Flare2,
    /// Three very fast taps: four sounds from one movement
    Crab,
}

/// Curve shared by every segment of every template
pub const GESTURE_CURVE: Curve = Curve::InOutQuint;

const OPEN: &[(f64, f64)] = &[(0.0, 1.0), (1.0, 1.0)];

const CLOSED: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 0.0)];

const CUT: &[(f64, f64)] = &[(0.0, 1.0), (0.9, 1.0), (0.95, 0.0), (1.0, 0.0)];

const TRANSFORM: &[(f64, f64)] = &[
    (0.0, 1.0),
    (0.25, 1.0),
    (0.25, 0.0),
    (0.5, 0.0),
    (0.5, 1.0),
    (0.75, 1.0),
    (0.75, 0.0),
    (1.0, 0.0),
];

const FLARE1: &[(f64, f64)] = &[
    (0.0, 1.0),
    (0.45, 1.0),
    (0.46, 0.0),
    (0.54, 0.0),
    (0.55, 1.0),
    (1.0, 1.0),
];

const FLARE2: &[(f64, f64)] = &[
    (0.0, 1.0),
    (0.28, 1.0),
    (0.30, 0.0),
    (0.36, 0.0),
    (0.38, 1.0),
    (0.62, 1.0),
    (0.64, 0.0),
    (0.70, 0.0),
    (0.72, 1.0),
    (1.0, 1.0),
];

const CRAB: &[(f64, f64)] = &[
    (0.0, 1.0),
    (0.20, 1.0),
    (0.22, 0.0),
    (0.25, 1.0),
    (0.45, 1.0),
    (0.47, 0.0),
    (0.50, 1.0),
    (0.70, 1.0),
    (0.72, 0.0),
    (0.75, 1.0),
    (1.0, 1.0),
];

static TEMPLATES: OnceLock<[Envelope; 7]> = OnceLock::new();

fn templates() -> &'static [Envelope; 7] {
    TEMPLATES.get_or_init(|| {
        Gesture::ALL.map(|gesture| Envelope::from_table(gesture.table(), GESTURE_CURVE))
    })
}

impl Gesture {
    pub const ALL: [Gesture; 7] = [
        Gesture::Open,
        Gesture::Closed,
        Gesture::Cut,
        Gesture::Transform,
        Gesture::Flare1,
        Gesture::Flare2,
        Gesture::Crab,
    ];

    /// Shared, immutable gain envelope for this gesture
    pub fn envelope(self) -> &'static Envelope {
        &templates()[self.index()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Gesture::Open => "open",
            Gesture::Closed => "closed",
            Gesture::Cut => "cut",
            Gesture::Transform => "transform",
            Gesture::Flare1 => "flare1",
            Gesture::Flare2 => "flare2",
            Gesture::Crab => "crab",
        }
    }

    fn index(self) -> usize {
        match self {
            Gesture::Open => 0,
            Gesture::Closed => 1,
            Gesture::Cut => 2,
            Gesture::Transform => 3,
            Gesture::Flare1 => 4,
            Gesture::Flare2 => 5,
            Gesture::Crab => 6,
        }
    }

    fn table(self) -> &'static [(f64, f64)] {
        match self {
            Gesture::Open => OPEN,
            Gesture::Closed => CLOSED,
            Gesture::Cut => CUT,
            Gesture::Transform => TRANSFORM,
            Gesture::Flare1 => FLARE1,
            Gesture::Flare2 => FLARE2,
            Gesture::Crab => CRAB,
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Gesture {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Gesture::ALL
            .iter()
            .copied()
            .find(|g| g.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| AutomationError::UnknownGesture(s.to_string()))
    }
}
