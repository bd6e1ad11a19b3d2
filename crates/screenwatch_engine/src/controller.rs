use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use screenwatch_core::{
    update, ControlError, ControllerState, CycleId, Effect, LifecycleEvent, Msg, SearchSettings,
    SearchState, SearchStatus,
};
use tokio::runtime::Handle;
use watch_logging::{watch_debug, watch_error, watch_info, watch_warn};

use crate::listener::ListenerRegistry;
use crate::{
    attempt, CancelHandle, Collaborators, ListenerId, SearchListener, Template, TemplateError,
};

/// Owns the search lifecycle and drives it against the collaborators.
///
/// Every transition goes through one mutex-guarded call to
/// [`screenwatch_core::update`]; effects run after the lock is released.
/// Capture and match run as a task on the supplied runtime and report back
/// through the same serialized path. Cloning yields another handle to the
/// same controller.
#[derive(Clone)]
pub struct SearchController {
    inner: Arc<Inner>,
}

impl SearchController {
    pub fn new(
        collaborators: Collaborators,
        settings: SearchSettings,
        runtime: Handle,
    ) -> Result<Self, ControlError> {
        settings.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ControllerState::with_settings(settings)),
                collaborators,
                listeners: ListenerRegistry::default(),
                outbox: Mutex::new(Outbox::default()),
                runtime,
                sequence: AtomicU64::new(0),
                pending_tick: Mutex::new(TaskSlot::default()),
                attempt: Mutex::new(TaskSlot::default()),
            }),
        })
    }

    /// Begins searching. Fails without changing state when no valid template
    /// is available or the controller is not `Stopped`/`Error`.
    pub fn start(&self) -> Result<(), ControlError> {
        watch_info!("Start requested");
        let template = self
            .inner
            .check_template()
            .map(|_| ())
            .map_err(|err| err.to_string());
        self.settle(self.inner.run(Msg::StartRequested { template }))
    }

    pub fn pause(&self) -> Result<(), ControlError> {
        watch_info!("Pause requested");
        self.settle(self.inner.run(Msg::PauseRequested))
    }

    pub fn resume(&self) -> Result<(), ControlError> {
        watch_info!("Resume requested");
        self.settle(self.inner.run(Msg::ResumeRequested))
    }

    /// Stops from any state. A failed teardown passes through `Error` and is
    /// then forced to `Stopped`.
    pub fn stop(&self) -> Result<(), ControlError> {
        watch_info!("Stop requested");
        self.inner.run(Msg::StopRequested).result?;
        if self.inner.phase() == SearchState::Error {
            watch_warn!("Teardown failed; forcing stop");
            self.inner.run(Msg::StopRequested).result?;
        }
        Ok(())
    }

    pub fn reset(&self) -> Result<(), ControlError> {
        watch_info!("Reset requested");
        self.inner.run(Msg::ResetRequested).result
    }

    pub fn status(&self) -> SearchStatus {
        self.inner.lock_state().status(Instant::now())
    }

    /// Validated immediately; takes effect once any attempt in flight ends.
    pub fn update_settings(&self, settings: SearchSettings) -> Result<(), ControlError> {
        watch_info!(
            "Settings update: interval={:?} threshold={:?} max_attempts={}",
            settings.interval,
            settings.match_threshold,
            settings.recovery.max_attempts
        );
        self.inner.run(Msg::SettingsChanged(settings)).result
    }

    pub fn subscribe(&self, listener: Arc<dyn SearchListener>) -> ListenerId {
        self.inner.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.listeners.unsubscribe(id)
    }

    /// Turns an accepted request that ended in `Error` into a failure.
    fn settle(&self, outcome: Outcome) -> Result<(), ControlError> {
        outcome.result?;
        let status = self.status();
        if status.state == SearchState::Error {
            let message = status.last_error.unwrap_or_else(|| "unknown failure".into());
            watch_error!("{}", message);
            return Err(ControlError::TransitionFailed(message));
        }
        Ok(())
    }
}

/// What the in-flight attempt should do after reporting a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Directive {
    Continue,
    Retry(Duration),
}

pub(crate) struct Outcome {
    pub(crate) result: Result<(), ControlError>,
    pub(crate) directive: Option<Directive>,
}

/// Events waiting for delivery, in the order their transitions happened.
#[derive(Default)]
struct Outbox {
    queue: VecDeque<LifecycleEvent>,
    delivering: bool,
}

/// Holds the cancel handle of the newest scheduled tick or running attempt.
/// `latest` survives cancellation so a slow registration can never replace
/// work reserved after it.
#[derive(Default)]
struct TaskSlot {
    latest: u64,
    handle: Option<CancelHandle>,
}

pub(crate) struct Inner {
    state: Mutex<ControllerState>,
    pub(crate) collaborators: Collaborators,
    listeners: ListenerRegistry,
    outbox: Mutex<Outbox>,
    runtime: Handle,
    sequence: AtomicU64,
    pending_tick: Mutex<TaskSlot>,
    attempt: Mutex<TaskSlot>,
}

impl Inner {
    /// Feeds `msg` and every follow-up message produced by its effects
    /// through the state machine.
    pub(crate) fn run(self: &Arc<Self>, msg: Msg) -> Outcome {
        let mut outcome = Outcome {
            result: Ok(()),
            directive: None,
        };
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let effects = self.dispatch(msg);
            self.deliver();
            for effect in effects {
                if let Some(next) = self.execute(effect, &mut outcome) {
                    queue.push_back(next);
                }
            }
        }
        outcome
    }

    pub(crate) fn check_template(&self) -> Result<Template, TemplateError> {
        let templates = &self.collaborators.templates;
        let template = templates.active().ok_or(TemplateError::Missing)?;
        templates.validate(&template)?;
        Ok(template)
    }

    /// Applies `msg` and queues its lifecycle events while still holding the
    /// state lock, so the outbox follows transition order across threads.
    fn dispatch(&self, msg: Msg) -> Vec<Effect> {
        let mut guard = self.lock_state();
        let state = std::mem::take(&mut *guard);
        let (state, effects) = update(state, msg, Instant::now());
        *guard = state;

        let mut outbox = lock(&self.outbox);
        let mut rest = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::Emit(event) => outbox.queue.push_back(event),
                other => rest.push(other),
            }
        }
        rest
    }

    /// Delivers queued events one at a time. A thread that finds delivery in
    /// progress leaves its events to the thread already delivering; this also
    /// covers a listener calling back into the controller.
    fn deliver(&self) {
        {
            let mut outbox = lock(&self.outbox);
            if outbox.delivering {
                return;
            }
            outbox.delivering = true;
        }
        loop {
            let event = {
                let mut outbox = lock(&self.outbox);
                match outbox.queue.pop_front() {
                    Some(event) => event,
                    None => {
                        outbox.delivering = false;
                        return;
                    }
                }
            };
            self.listeners.emit(&event);
        }
    }

    fn execute(self: &Arc<Self>, effect: Effect, outcome: &mut Outcome) -> Option<Msg> {
        match effect {
            // Queued by `dispatch`.
            Effect::Emit(_) => None,
            Effect::Rejected(err) => {
                watch_warn!("Rejected: {}", err);
                if outcome.result.is_ok() {
                    outcome.result = Err(err);
                }
                None
            }
            Effect::PrepareSearch => Some(Msg::SetupFinished(self.acquire())),
            Effect::ReleaseResources => Some(Msg::PauseFinished(self.release())),
            Effect::ReacquireResources => Some(Msg::ResumeFinished(self.acquire())),
            Effect::Teardown => Some(Msg::TeardownFinished(self.release())),
            Effect::ScheduleTick { cycle, delay } => {
                self.schedule_tick(cycle, delay);
                None
            }
            Effect::CancelPending => {
                self.cancel_pending();
                None
            }
            Effect::RunAttempt { cycle, threshold } => {
                self.spawn_attempt(cycle, threshold);
                None
            }
            Effect::ContinueAttempt { .. } => {
                outcome.directive = Some(Directive::Continue);
                None
            }
            Effect::RetryStep {
                cycle,
                category,
                delay,
            } => {
                watch_debug!("Retrying {} in cycle {} after {:?}", category, cycle, delay);
                outcome.directive = Some(Directive::Retry(delay));
                None
            }
            Effect::Notify(result) => {
                let notifier = self.collaborators.notifier.clone();
                self.runtime.spawn_blocking(move || notifier.notify(&result));
                None
            }
        }
    }

    fn acquire(&self) -> Result<(), String> {
        self.check_template().map_err(|err| err.to_string())?;
        self.collaborators
            .capturer
            .prepare()
            .map_err(|err| err.to_string())
    }

    fn release(&self) -> Result<(), String> {
        self.cancel_pending();
        self.collaborators
            .capturer
            .release()
            .map_err(|err| err.to_string())
    }

    fn schedule_tick(self: &Arc<Self>, cycle: CycleId, delay: Duration) {
        let Some(seq) = self.reserve(cycle) else {
            watch_debug!("Cycle {} ended before its tick was scheduled", cycle);
            return;
        };
        let weak = Arc::downgrade(self);
        let handle = self.collaborators.clock.after(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    watch_debug!("Tick for cycle {}", cycle);
                    inner.run(Msg::TickFired { cycle });
                }
            }),
        );
        self.install(&self.pending_tick, seq, cycle, handle);
    }

    fn spawn_attempt(self: &Arc<Self>, cycle: CycleId, threshold: Option<f32>) {
        let Some(seq) = self.reserve(cycle) else {
            return;
        };
        let handle = CancelHandle::new();
        let token = handle.token().clone();
        if self.install(&self.attempt, seq, cycle, handle) {
            self.runtime
                .spawn(attempt::run(Arc::clone(self), cycle, threshold, token));
        }
    }

    /// Orders work for `cycle` against everything reserved before it, or
    /// refuses when the cycle has already ended.
    fn reserve(&self, cycle: CycleId) -> Option<u64> {
        let state = self.lock_state();
        (state.cycle() == cycle).then(|| self.sequence.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Stores `handle` in `slot` and cancels what it replaces. Work reserved
    /// after `seq` is never replaced; instead `handle` itself is cancelled, as
    /// it is when `cycle` ended meanwhile. Returns whether `handle` is live.
    fn install(
        &self,
        slot: &Mutex<TaskSlot>,
        seq: u64,
        cycle: CycleId,
        handle: CancelHandle,
    ) -> bool {
        {
            let mut slot = lock(slot);
            if seq < slot.latest {
                handle.cancel();
                return false;
            }
            slot.latest = seq;
            if let Some(previous) = slot.handle.replace(handle.clone()) {
                previous.cancel();
            }
        }
        // A stop or pause that bumped the cycle may have emptied the slot
        // before `handle` landed in it.
        if self.lock_state().cycle() != cycle {
            handle.cancel();
            return false;
        }
        true
    }

    fn cancel_pending(&self) {
        if let Some(tick) = lock(&self.pending_tick).handle.take() {
            tick.cancel();
        }
        if let Some(attempt) = lock(&self.attempt).handle.take() {
            attempt.cancel();
        }
    }

    fn phase(&self) -> SearchState {
        self.lock_state().phase()
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        lock(&self.state)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
