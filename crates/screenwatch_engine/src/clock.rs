use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Cancels a scheduled callback. Cancelling twice, or after the callback
/// ran, is harmless.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

pub trait Clock: Send + Sync {
    /// Run `callback` once after `delay` unless the returned handle is cancelled first.
    fn after(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> CancelHandle;
}

/// Timer backed by `tokio::time` on the given runtime.
#[derive(Debug, Clone)]
pub struct TokioClock {
    runtime: Handle,
}

impl TokioClock {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl Clock for TokioClock {
    fn after(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> CancelHandle {
        let handle = CancelHandle::new();
        let token = handle.token().clone();
        self.runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if !token.is_cancelled() {
                        callback();
                    }
                }
            }
        });
        handle
    }
}
