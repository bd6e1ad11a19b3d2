use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use screenwatch_core::{LifecycleEvent, SearchResult, SearchState};

/// Observer of controller lifecycle events. Every method defaults to a no-op.
///
/// Events arrive one at a time and in the order the transitions happened,
/// even when several threads drive the controller. They are never delivered
/// while controller state is locked, so a listener may call back into the
/// controller; events caused by such a call follow once the current callback
/// returns. When delivery is already running on another thread, that thread
/// delivers the caller's events and the call returns without waiting.
pub trait SearchListener: Send + Sync {
    fn on_started(&self) {}
    fn on_stopped(&self) {}
    fn on_paused(&self) {}
    fn on_resumed(&self) {}
    fn on_error(&self, _message: &str) {}
    fn on_result_found(&self, _result: &SearchResult) {}
    fn on_state_changed(&self, _state: SearchState) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<(ListenerId, Arc<dyn SearchListener>)>>,
}

impl ListenerRegistry {
    pub(crate) fn subscribe(&self, listener: Arc<dyn SearchListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Delivers to a snapshot of the registry, in registration order.
    pub(crate) fn emit(&self, event: &LifecycleEvent) {
        let snapshot: Vec<Arc<dyn SearchListener>> = self
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in snapshot {
            match event {
                LifecycleEvent::Started => listener.on_started(),
                LifecycleEvent::Stopped => listener.on_stopped(),
                LifecycleEvent::Paused => listener.on_paused(),
                LifecycleEvent::Resumed => listener.on_resumed(),
                LifecycleEvent::Error(message) => listener.on_error(message),
                LifecycleEvent::ResultFound(result) => listener.on_result_found(result),
                LifecycleEvent::StateChanged(state) => listener.on_state_changed(*state),
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Arc<dyn SearchListener>)>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
