//! Screenwatch core: pure search lifecycle state machine and recovery policy.
mod effect;
mod error;
mod msg;
mod recovery;
mod result;
mod settings;
mod state;
mod status;
mod update;

pub use effect::{Effect, LifecycleEvent};
pub use error::{ControlError, Operation, ResultError};
pub use msg::Msg;
pub use recovery::{FailureCategory, RecoveryConfig, RecoveryDecision, RecoveryTracker};
pub use result::{Point, SearchResult};
pub use settings::SearchSettings;
pub use state::{ControllerState, CycleId, SearchState};
pub use status::SearchStatus;
pub use update::update;
