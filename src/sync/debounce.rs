use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;

/// One-shot timer with cancel-and-restart semantics.
///
/// At most one fire is ever pending: restarting before the delay elapses
/// aborts the previous timer, so a burst of rapid mutations coalesces into
/// a single fire once the caller goes quiet. There is no maximum-delay
/// fallback; a caller restarting faster than the window forever will never
/// fire. Callers must hold a tokio runtime.
pub struct Debounce {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedules `task` to run after the delay, dropping any previously
    /// scheduled run that has not fired yet.
    pub fn restart<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock().expect("Debounce lock poisoned");
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            task.await;
        }));
    }

    /// Drops the pending run, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().expect("Debounce lock poisoned");
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        let pending = self.pending.lock().expect("Debounce lock poisoned");
        match pending.as_ref() {
            Some(handle) => !handle.is_finished(),
            None => false,
        }
    }
}
