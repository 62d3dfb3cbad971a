//! Scratch automation for Platter
//!
//! Describes a scratch performance as a list of platter moves and crossfader
//! gestures timed in beats, and turns it into a function of real time that
//! yields `(head position in seconds, gain)` pairs for the playback engine.

mod action;
mod easing;
mod envelope;
mod error;
mod gesture;
pub mod pattern;
mod routine;
mod sequencer;

pub use action::{Fader, ScratchAction};
pub use easing::{Curve, Easing};
pub use envelope::{Envelope, EnvelopeBuilder, Keyframe};
pub use error::AutomationError;
pub use gesture::{Gesture, GESTURE_CURVE};
pub use pattern::keyframes_from_pattern;
pub use routine::{Routine, DEFAULT_BPM, DEFAULT_MICRO_CURVE, DEFAULT_RPM};
pub use sequencer::{Location, Sequencer, TimedAction};
