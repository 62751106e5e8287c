//! Readiness broadcast for pollers.
//!
//! Models the host's selectable-wakeup primitive: a poller that finds
//! nothing ready registers a wake callback, and the next event enqueue (or
//! close) consumes and fires every registered callback. Registrations are
//! one-shot — a woken poller re-polls and re-registers.

use std::sync::{Arc, Weak};

/// Wake callback registered by a poller.
///
/// Implementations must be cheap and must not block: broadcasts run under
/// the session lock.
pub trait ReadyWaker: Send + Sync {
    /// Notify the poller that readiness may have changed.
    fn wake(&self);
}

/// Readiness verdict for a "readable" query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// The session is closing; report hang-up.
    HangUp,
    /// At least one event is queued.
    Readable,
    /// Nothing queued; the watcher (if any) was registered.
    NotReady,
}

/// Set of registered one-shot wake callbacks.
///
/// Holds weak references so a poller that went away costs nothing but a
/// skipped slot at the next broadcast.
#[derive(Default)]
pub(crate) struct Readiness {
    watchers: Vec<Weak<dyn ReadyWaker>>,
}

impl Readiness {
    /// Register a watcher for the next broadcast.
    pub(crate) fn register(&mut self, watcher: &Arc<dyn ReadyWaker>) {
        self.watchers.push(Arc::downgrade(watcher));
    }

    /// Consume all registrations, waking every watcher still alive.
    pub(crate) fn broadcast(&mut self) {
        for weak in self.watchers.drain(..) {
            if let Some(watcher) = weak.upgrade() {
                watcher.wake();
            }
        }
    }
}

impl std::fmt::Debug for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Readiness").field("watchers", &self.watchers.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingWaker(AtomicU32);

    impl ReadyWaker for CountingWaker {
        fn wake(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn broadcast_consumes_registrations() {
        let waker = Arc::new(CountingWaker(AtomicU32::new(0)));
        let as_dyn: Arc<dyn ReadyWaker> = waker.clone();

        let mut readiness = Readiness::default();
        readiness.register(&as_dyn);
        readiness.broadcast();
        assert_eq!(waker.0.load(Ordering::SeqCst), 1);

        // One-shot: a second broadcast without re-registration is silent
        readiness.broadcast();
        assert_eq!(waker.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dead_watchers_are_skipped() {
        let mut readiness = Readiness::default();
        {
            let waker = Arc::new(CountingWaker(AtomicU32::new(0)));
            let as_dyn: Arc<dyn ReadyWaker> = waker;
            readiness.register(&as_dyn);
        }
        readiness.broadcast();
    }
}
