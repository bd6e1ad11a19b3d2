use crate::{CycleId, FailureCategory, SearchResult, SearchSettings};

/// Everything that can drive the lifecycle state machine.
///
/// Requests come from callers; the `*Finished` messages report the outcome
/// of effects the controller executed; the remaining variants come from the
/// tick timer and the in-flight search attempt and carry the cycle they
/// belong to.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Caller asked to begin searching. `template` is the result of looking
    /// up and validating the active template.
    StartRequested { template: Result<(), String> },
    SetupFinished(Result<(), String>),
    PauseRequested,
    PauseFinished(Result<(), String>),
    ResumeRequested,
    ResumeFinished(Result<(), String>),
    StopRequested,
    TeardownFinished(Result<(), String>),
    ResetRequested,
    SettingsChanged(SearchSettings),
    /// The scheduled tick for `cycle` elapsed.
    TickFired { cycle: CycleId },
    /// The attempt could not obtain a valid template.
    TemplateUnavailable { cycle: CycleId, message: String },
    StepSucceeded {
        cycle: CycleId,
        category: FailureCategory,
    },
    StepFailed {
        cycle: CycleId,
        category: FailureCategory,
        message: String,
    },
    /// Capture and match both succeeded.
    AttemptFinished { cycle: CycleId, result: SearchResult },
}
