use std::fmt;

use thiserror::Error;

use crate::{FailureCategory, SearchState};

/// Public controller operations, used to describe rejected requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Start => "start",
            Operation::Pause => "pause",
            Operation::Resume => "resume",
            Operation::Stop => "stop",
            Operation::Reset => "reset",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// The operation is not legal in the current state. Nothing changed.
    #[error("cannot {operation} while {from}")]
    InvalidTransition {
        from: SearchState,
        operation: Operation,
    },
    #[error("no usable template: {0}")]
    MissingTemplate(String),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    /// The transition was attempted but a collaborator failed; the
    /// controller is in `Error`.
    #[error("{0}")]
    TransitionFailed(String),
    /// Retry budget for a category ran out; the controller is in `Error`.
    #[error("{category} failed after {attempts} attempts: {message}")]
    TerminalFailure {
        category: FailureCategory,
        attempts: u32,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ResultError {
    #[error("confidence {0} outside (0, 1]")]
    ConfidenceOutOfRange(f32),
}
