use std::time::Duration;

use crate::{SearchResult, SearchState};

/// Point-in-time view of the controller, rebuilt on every read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchStatus {
    pub state: SearchState,
    pub active_for: Duration,
    pub paused_for: Duration,
    pub search_attempts: u64,
    pub successful_finds: u64,
    pub last_result: Option<SearchResult>,
    pub last_error: Option<String>,
}
