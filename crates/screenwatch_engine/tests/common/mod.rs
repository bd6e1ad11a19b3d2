#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use screenwatch_engine::{
    CancelHandle, CaptureError, Capturer, Clock, Collaborators, LifecycleEvent, MatchError,
    Matcher, Notifier, Point, RecoveryConfig, SearchController, SearchListener, SearchResult,
    SearchSettings, SearchState, Snapshot, Template, TemplateStore,
};
use tokio::sync::mpsc;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(watch_logging::initialize_for_tests);
}

pub fn template() -> Template {
    Template::new(Point::new(40, 40), 12, 0.8, vec![7u8; 64]).unwrap()
}

pub fn hit(x: i32, y: i32, confidence: f32) -> SearchResult {
    SearchResult::found(Point::new(x, y), confidence).unwrap()
}

pub fn fast_settings() -> SearchSettings {
    SearchSettings {
        interval: Duration::from_millis(50),
        match_threshold: None,
        recovery: RecoveryConfig {
            max_attempts: 3,
            backoff_base: Duration::from_millis(1),
            backoff_max: Duration::from_millis(4),
        },
    }
}

#[derive(Default)]
pub struct ScriptedCapturer {
    script: Mutex<VecDeque<Result<Snapshot, CaptureError>>>,
    calls: AtomicUsize,
    prepare_error: Mutex<Option<CaptureError>>,
    release_error: Mutex<Option<CaptureError>>,
}

impl ScriptedCapturer {
    pub fn push(&self, outcome: Result<Snapshot, CaptureError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn fail_times(&self, times: usize) {
        for _ in 0..times {
            self.push(Err(CaptureError::Failed("screen locked".into())));
        }
    }

    pub fn fail_prepare(&self, err: CaptureError) {
        *self.prepare_error.lock().unwrap() = Some(err);
    }

    pub fn fail_release(&self, err: CaptureError) {
        *self.release_error.lock().unwrap() = Some(err);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Capturer for ScriptedCapturer {
    async fn capture(&self) -> Result<Snapshot, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Snapshot::new(vec![1u8, 2, 3])))
    }

    fn prepare(&self) -> Result<(), CaptureError> {
        match self.prepare_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn release(&self) -> Result<(), CaptureError> {
        match self.release_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct ScriptedMatcher {
    script: Mutex<VecDeque<Result<SearchResult, MatchError>>>,
    thresholds: Mutex<Vec<f32>>,
}

impl ScriptedMatcher {
    pub fn push(&self, outcome: Result<SearchResult, MatchError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.thresholds.lock().unwrap().len()
    }

    pub fn thresholds(&self) -> Vec<f32> {
        self.thresholds.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Matcher for ScriptedMatcher {
    async fn find(
        &self,
        _snapshot: &Snapshot,
        template: &Template,
    ) -> Result<SearchResult, MatchError> {
        self.thresholds.lock().unwrap().push(template.match_threshold);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(SearchResult::not_found()))
    }
}

#[derive(Default)]
pub struct MemoryTemplateStore {
    template: Mutex<Option<Template>>,
}

impl MemoryTemplateStore {
    pub fn with(template: Template) -> Self {
        Self {
            template: Mutex::new(Some(template)),
        }
    }

    pub fn remove(&self) {
        *self.template.lock().unwrap() = None;
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn active(&self) -> Option<Template> {
        self.template.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    results: Mutex<Vec<SearchResult>>,
}

impl RecordingNotifier {
    pub fn results(&self) -> Vec<SearchResult> {
        self.results.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, result: &SearchResult) {
        self.results.lock().unwrap().push(*result);
    }
}

type Pending = (Duration, CancelHandle, Box<dyn FnOnce() + Send>);

/// Clock whose callbacks only run when the test fires them.
#[derive(Default)]
pub struct ManualClock {
    pending: Mutex<Vec<Pending>>,
}

impl ManualClock {
    /// Runs every scheduled, uncancelled callback. Returns how many ran.
    pub fn fire_all(&self) -> usize {
        let due: Vec<Pending> = self.pending.lock().unwrap().drain(..).collect();
        let mut fired = 0;
        for (_, handle, callback) in due {
            if !handle.is_cancelled() {
                callback();
                fired += 1;
            }
        }
        fired
    }

    pub fn scheduled(&self) -> Vec<Duration> {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, handle, _)| !handle.is_cancelled())
            .map(|(delay, _, _)| *delay)
            .collect()
    }
}

impl Clock for ManualClock {
    fn after(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> CancelHandle {
        let handle = CancelHandle::new();
        self.pending
            .lock()
            .unwrap()
            .push((delay, handle.clone(), callback));
        handle
    }
}

pub struct ChannelListener {
    tx: mpsc::UnboundedSender<LifecycleEvent>,
}

impl ChannelListener {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }

    fn send(&self, event: LifecycleEvent) {
        let _ = self.tx.send(event);
    }
}

impl SearchListener for ChannelListener {
    fn on_started(&self) {
        self.send(LifecycleEvent::Started);
    }
    fn on_stopped(&self) {
        self.send(LifecycleEvent::Stopped);
    }
    fn on_paused(&self) {
        self.send(LifecycleEvent::Paused);
    }
    fn on_resumed(&self) {
        self.send(LifecycleEvent::Resumed);
    }
    fn on_error(&self, message: &str) {
        self.send(LifecycleEvent::Error(message.to_string()));
    }
    fn on_result_found(&self, result: &SearchResult) {
        self.send(LifecycleEvent::ResultFound(*result));
    }
    fn on_state_changed(&self, state: SearchState) {
        self.send(LifecycleEvent::StateChanged(state));
    }
}

pub struct Harness {
    pub controller: SearchController,
    pub capturer: Arc<ScriptedCapturer>,
    pub matcher: Arc<ScriptedMatcher>,
    pub templates: Arc<MemoryTemplateStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub events: mpsc::UnboundedReceiver<LifecycleEvent>,
}

impl Harness {
    pub fn new(templates: MemoryTemplateStore) -> Self {
        Self::with_settings(templates, fast_settings())
    }

    pub fn with_settings(templates: MemoryTemplateStore, settings: SearchSettings) -> Self {
        init_logging();
        let capturer = Arc::new(ScriptedCapturer::default());
        let matcher = Arc::new(ScriptedMatcher::default());
        let templates = Arc::new(templates);
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(ManualClock::default());
        let collaborators = Collaborators {
            capturer: capturer.clone(),
            matcher: matcher.clone(),
            templates: templates.clone(),
            notifier: notifier.clone(),
            clock: clock.clone(),
        };
        let controller =
            SearchController::new(collaborators, settings, tokio::runtime::Handle::current())
                .unwrap();
        let (listener, events) = ChannelListener::new();
        controller.subscribe(listener);

        Self {
            controller,
            capturer,
            matcher,
            templates,
            notifier,
            clock,
            events,
        }
    }

    /// Drains events delivered so far without waiting.
    pub fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Waits for the first event matching `predicate`, discarding others.
    pub async fn expect_event(
        &mut self,
        predicate: impl Fn(&LifecycleEvent) -> bool,
    ) -> LifecycleEvent {
        let wait = async {
            while let Some(event) = self.events.recv().await {
                if predicate(&event) {
                    return event;
                }
            }
            panic!("listener channel closed");
        };
        tokio::time::timeout(Duration::from_secs(2), wait)
            .await
            .expect("expected event was not delivered")
    }

    /// Fires the pending tick and waits until the controller has counted
    /// `attempts` completed attempts.
    pub async fn tick_until_attempts(&self, attempts: u64) {
        self.clock.fire_all();
        wait_until(|| self.controller.status().search_attempts >= attempts).await;
    }
}

pub async fn wait_until(condition: impl Fn() -> bool) {
    let wait = async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(2), wait)
        .await
        .expect("condition not reached in time");
}
