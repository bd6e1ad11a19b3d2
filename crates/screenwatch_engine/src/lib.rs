//! Screenwatch engine: runs the search lifecycle against real collaborators.
mod attempt;
mod clock;
mod collaborators;
mod controller;
mod listener;
mod persist;
mod settings_file;
mod template;
mod template_store;
mod types;

pub use clock::{CancelHandle, Clock, TokioClock};
pub use collaborators::{Capturer, Collaborators, Matcher, Notifier, Snapshot, TemplateStore};
pub use controller::SearchController;
pub use listener::{ListenerId, SearchListener};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use settings_file::{load_settings, save_settings};
pub use template::Template;
pub use template_store::FileTemplateStore;
pub use types::{CaptureError, MatchError, TemplateError};

pub use screenwatch_core::{
    ControlError, FailureCategory, LifecycleEvent, Operation, Point, RecoveryConfig,
    SearchResult, SearchSettings, SearchState, SearchStatus,
};
