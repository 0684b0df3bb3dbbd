use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Trailing-edge debounce controller.
///
/// Holds at most one pending save. `schedule` cancels the pending one (if its
/// timer has not fired yet) and arms a new timer; the save runs once the
/// timer elapses without another `schedule`.
///
/// A save that already started keeps running: only the waiting phase is
/// cancellable.
pub struct Debouncer<F> {
    delay: Duration,
    save: Arc<F>,
    runtime: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<F, Fut> Debouncer<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    /// Create a controller on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(delay: Duration, save: F) -> Self {
        Self::with_handle(Handle::current(), delay, save)
    }

    /// Create a controller that spawns its timers on `runtime`.
    ///
    /// Use this when `schedule` will be called from threads that are not
    /// part of the runtime (e.g. a file watcher callback).
    pub fn with_handle(runtime: Handle, delay: Duration, save: F) -> Self {
        Self {
            delay,
            save: Arc::new(save),
            runtime,
            pending: Mutex::new(None),
        }
    }

    /// Cancel the pending save (if any) and arm a new timer.
    pub fn schedule(&self) {
        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let save = Arc::clone(&self.save);
        let runtime = self.runtime.clone();
        let delay = self.delay;

        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached so a later `schedule` cannot abort a save mid-flight.
            runtime.spawn(save());
        }));
        crate::debug!("autosave"; "save scheduled in {}ms", delay.as_millis());
    }

    /// Cancel the pending save.
    ///
    /// Returns `true` if a timer was still waiting.
    pub fn cancel(&self) -> bool {
        let Some(handle) = self.pending.lock().take() else {
            return false;
        };
        let waiting = !handle.is_finished();
        handle.abort();
        waiting
    }

    /// Whether a save is waiting for its timer.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<F> Drop for Debouncer<F> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}
