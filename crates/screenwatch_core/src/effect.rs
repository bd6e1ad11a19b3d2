use std::time::Duration;

use crate::{ControlError, CycleId, FailureCategory, SearchResult, SearchState};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver to listeners, in order.
    Emit(LifecycleEvent),
    /// The requested operation was refused; state is unchanged.
    Rejected(ControlError),
    /// Check the template and ready the capturer; answer with `SetupFinished`.
    PrepareSearch,
    /// Release capture resources; answer with `PauseFinished`.
    ReleaseResources,
    /// Re-acquire capture resources; answer with `ResumeFinished`.
    ReacquireResources,
    /// Final cleanup; answer with `TeardownFinished`.
    Teardown,
    ScheduleTick { cycle: CycleId, delay: Duration },
    /// Cancel the scheduled tick and any attempt in flight.
    CancelPending,
    RunAttempt {
        cycle: CycleId,
        threshold: Option<f32>,
    },
    /// The attempt may move on to its next step.
    ContinueAttempt { cycle: CycleId },
    /// The attempt should wait `delay` and repeat the failed step.
    RetryStep {
        cycle: CycleId,
        category: FailureCategory,
        delay: Duration,
    },
    Notify(SearchResult),
}

/// Events observed by registered listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Started,
    Stopped,
    Paused,
    Resumed,
    Error(String),
    ResultFound(SearchResult),
    StateChanged(SearchState),
}
