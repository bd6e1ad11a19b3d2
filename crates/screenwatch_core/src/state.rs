use std::fmt;
use std::time::{Duration, Instant};

use crate::{RecoveryTracker, SearchResult, SearchSettings, SearchStatus};

/// Identifies one run of ticks. Bumped whenever the search leaves `Active`
/// so completions from an abandoned run can be recognised and dropped.
pub type CycleId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchState {
    #[default]
    Stopped,
    Starting,
    Active,
    Pausing,
    Paused,
    Resuming,
    Stopping,
    Error,
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchState::Stopped => "stopped",
            SearchState::Starting => "starting",
            SearchState::Active => "active",
            SearchState::Pausing => "pausing",
            SearchState::Paused => "paused",
            SearchState::Resuming => "resuming",
            SearchState::Stopping => "stopping",
            SearchState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Accumulated time spent `Active` and `Paused`.
#[derive(Debug, Clone, PartialEq, Default)]
struct PhaseClock {
    active: Duration,
    paused: Duration,
    current: Option<(SearchState, Instant)>,
}

impl PhaseClock {
    fn enter(&mut self, phase: SearchState, now: Instant) {
        self.close(now);
        self.current = match phase {
            SearchState::Active | SearchState::Paused => Some((phase, now)),
            _ => None,
        };
    }

    fn close(&mut self, now: Instant) {
        if let Some((phase, since)) = self.current.take() {
            let spent = now.saturating_duration_since(since);
            match phase {
                SearchState::Active => self.active += spent,
                SearchState::Paused => self.paused += spent,
                _ => {}
            }
        }
    }

    fn totals(&self, now: Instant) -> (Duration, Duration) {
        let (mut active, mut paused) = (self.active, self.paused);
        if let Some((phase, since)) = self.current {
            let spent = now.saturating_duration_since(since);
            match phase {
                SearchState::Active => active += spent,
                SearchState::Paused => paused += spent,
                _ => {}
            }
        }
        (active, paused)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControllerState {
    phase: SearchState,
    settings: SearchSettings,
    pending_settings: Option<SearchSettings>,
    recovery: RecoveryTracker,
    cycle: CycleId,
    attempt_in_flight: bool,
    search_attempts: u64,
    successful_finds: u64,
    last_result: Option<SearchResult>,
    last_error: Option<String>,
    clock: PhaseClock,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SearchSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> SearchState {
        self.phase
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn pending_settings(&self) -> Option<&SearchSettings> {
        self.pending_settings.as_ref()
    }

    pub fn recovery(&self) -> &RecoveryTracker {
        &self.recovery
    }

    pub fn attempt_in_flight(&self) -> bool {
        self.attempt_in_flight
    }

    pub fn status(&self, now: Instant) -> SearchStatus {
        let (active_for, paused_for) = self.clock.totals(now);
        SearchStatus {
            state: self.phase,
            active_for,
            paused_for,
            search_attempts: self.search_attempts,
            successful_finds: self.successful_finds,
            last_result: self.last_result,
            last_error: self.last_error.clone(),
        }
    }

    pub(crate) fn set_phase(&mut self, phase: SearchState, now: Instant) {
        self.phase = phase;
        self.clock.enter(phase, now);
    }

    /// Invalidates the current cycle and returns the new one.
    pub(crate) fn next_cycle(&mut self) -> CycleId {
        self.cycle = self.cycle.wrapping_add(1);
        self.end_attempt();
        self.cycle
    }

    pub(crate) fn is_current(&self, cycle: CycleId) -> bool {
        self.phase == SearchState::Active && self.cycle == cycle && self.attempt_in_flight
    }

    pub(crate) fn begin_attempt(&mut self) {
        self.attempt_in_flight = true;
    }

    /// Ends the attempt and applies any settings deferred while it ran.
    pub(crate) fn end_attempt(&mut self) {
        self.attempt_in_flight = false;
        if let Some(settings) = self.pending_settings.take() {
            self.settings = settings;
        }
    }

    pub(crate) fn change_settings(&mut self, settings: SearchSettings) {
        if self.attempt_in_flight {
            self.pending_settings = Some(settings);
        } else {
            self.settings = settings;
            self.pending_settings = None;
        }
    }

    pub(crate) fn recovery_mut(&mut self) -> &mut RecoveryTracker {
        &mut self.recovery
    }

    pub(crate) fn record_result(&mut self, result: SearchResult) {
        self.search_attempts += 1;
        if result.is_found() {
            self.successful_finds += 1;
            self.last_result = Some(result);
        }
    }

    pub(crate) fn set_last_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    /// Clears statistics and recovery counters for a fresh run.
    pub(crate) fn reset_run(&mut self) {
        self.search_attempts = 0;
        self.successful_finds = 0;
        self.last_result = None;
        self.last_error = None;
        self.recovery.reset();
        self.clock = PhaseClock::default();
    }
}
