//! Cooperative cancellation for background loops.
//!
//! The token owns the only sender of a zero-traffic channel. Cancelling drops
//! that sender, which disconnects every receiver at once, so a loop blocked in
//! `recv`, `recv_timeout` or `select!` wakes immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::debug;

struct Inner {
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
    cancelled: AtomicBool,
}

/// Clonable cancellation token. All clones observe the same cancellation.
#[derive(Clone)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                trigger: Mutex::new(Some(trigger)),
                signal,
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            debug!("Shutdown requested");
        }
        self.inner.trigger.lock().take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Sleeps for up to `timeout`. Returns `true` as soon as the token is
    /// cancelled, `false` if the full timeout elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        !matches!(
            self.inner.signal.recv_timeout(timeout),
            Err(RecvTimeoutError::Timeout)
        )
    }

    /// Receiver that disconnects on cancellation, for use in `select!`.
    pub fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shutdown")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn wait_times_out_while_active() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.wait_timeout(Duration::from_millis(10)));
        assert!(!shutdown.is_cancelled());
    }

    #[test]
    fn cancel_wakes_waiter_early() {
        let shutdown = Shutdown::new();
        let waiter = shutdown.clone();
        let started = Instant::now();
        let handle = thread::spawn(move || waiter.wait_timeout(Duration::from_secs(30)));

        thread::sleep(Duration::from_millis(20));
        shutdown.cancel();

        assert!(handle.join().unwrap());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn cancel_is_idempotent() {
        let shutdown = Shutdown::new();
        shutdown.cancel();
        shutdown.cancel();
        assert!(shutdown.is_cancelled());
        assert!(shutdown.wait_timeout(Duration::from_secs(1)));
    }
}
