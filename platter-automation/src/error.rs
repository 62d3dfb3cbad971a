//! Errors raised while building envelopes, actions and sequences

use thiserror::Error;

/// Errors that can occur while building scratch automation
///
/// All of these are construction-time failures: once a [`Sequencer`] exists
/// every query on it is infallible.
///
/// [`Sequencer`]: crate::Sequencer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AutomationError {
    #[error("actions list empty")]
    EmptyActions,
    #[error("beat duration must be positive")]
    NonPositiveBeatDuration,
    #[error("platter revolution duration must be positive")]
    NonPositivePlatterDuration,
    #[error("envelope requires at least 2 keyframes, got {count}")]
    TooFewKeyframes { count: usize },
    #[error("action duration must be positive, got {duration} beats")]
    NonPositiveActionDuration { duration: f64 },
    #[error("action {index}: {source}")]
    InvalidAction {
        index: usize,
        #[source]
        source: Box<AutomationError>,
    },
    #[error("invalid pattern character in {pattern:?}")]
    InvalidPatternCharacter { pattern: String },
    #[error("keyframe position {pos} must be greater than {last}")]
    NonIncreasingKeyframe { last: f64, pos: f64 },
    #[error("unknown easing: {0}")]
    UnknownEasing(String),
    #[error("unknown fader gesture: {0}")]
    UnknownGesture(String),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}
