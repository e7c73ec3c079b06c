//! ## kvota-core::signal
//! **Bounded, drop-on-full notification channels**
//!
//! Producers sit on the mutation hot path and must never stall, so `publish`
//! uses `try_send` and counts what it could not deliver. Delivered events are
//! FIFO. Cloned handles share the channel; concurrent consumers race for
//! individual events, there is no broadcast.
//!
//! Two event types travel through these channels:
//! - [`StockChange`]: the signed delta of each inventory mutation.
//! - [`Restock`]: a unit event raised by the threshold monitor. Its channel has
//!   capacity 1, which is what coalesces repeated breaches into one signal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{bounded, select, Receiver, Sender, TrySendError};
use tracing::trace;

use crate::error::CoreError;
use crate::shutdown::Shutdown;

/// Default capacity of the stock change channel.
pub const DEFAULT_CHANGE_CAPACITY: usize = 60;

/// Signed stock delta: `-1` for a take, `+1` for a return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StockChange(pub i64);

impl StockChange {
    pub const TAKE: Self = Self(-1);
    pub const RETURN: Self = Self(1);

    pub fn delta(self) -> i64 {
        self.0
    }
}

/// Restock needed: the level was sampled below the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Restock;

/// Bounded multi-producer channel that drops new events when full.
pub struct EventChannel<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    dropped: Arc<AtomicU64>,
}

impl<T> EventChannel<T> {
    pub fn with_capacity(capacity: usize) -> Result<Self, CoreError> {
        if capacity == 0 {
            return Err(CoreError::InvalidCapacity);
        }
        let (sender, receiver) = bounded(capacity);
        Ok(Self {
            sender,
            receiver,
            dropped: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Offers an event without blocking.
    ///
    /// Returns `false` when the buffer is full and the event was dropped. A
    /// dropped event is lost telemetry, not an error.
    #[inline]
    pub fn publish(&self, event: T) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("Event channel full, dropping event");
                false
            }
        }
    }

    /// Blocks until an event arrives or `shutdown` is cancelled.
    ///
    /// Returns `None` on cancellation; events still buffered stay in place.
    pub fn consume(&self, shutdown: &Shutdown) -> Option<T> {
        if shutdown.is_cancelled() {
            return None;
        }
        select! {
            recv(self.receiver) -> event => event.ok(),
            recv(shutdown.signal()) -> _ => None,
        }
    }

    /// Blocks for at most `timeout`.
    pub fn consume_timeout(&self, timeout: Duration) -> Option<T> {
        self.receiver.recv_timeout(timeout).ok()
    }

    pub fn try_consume(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.sender.is_full()
    }

    pub fn capacity(&self) -> usize {
        // Always bounded: `with_capacity` rejects zero and builds a bounded channel.
        self.sender.capacity().unwrap_or_default()
    }

    /// Number of events dropped because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }
}

impl<T> std::fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("dropped", &self.dropped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            EventChannel::<StockChange>::with_capacity(0),
            Err(CoreError::InvalidCapacity)
        ));
    }

    #[test]
    fn maintains_fifo_order() {
        let channel = EventChannel::with_capacity(4).unwrap();
        assert!(channel.publish(StockChange::TAKE));
        assert!(channel.publish(StockChange::RETURN));

        assert_eq!(channel.try_consume(), Some(StockChange::TAKE));
        assert_eq!(channel.try_consume(), Some(StockChange::RETURN));
        assert_eq!(channel.try_consume(), None);
    }

    #[test]
    fn drops_newest_when_full() {
        let channel = EventChannel::with_capacity(2).unwrap();
        assert!(channel.publish(StockChange(-1)));
        assert!(channel.publish(StockChange(-2)));
        assert!(!channel.publish(StockChange(-3)));

        assert!(channel.is_full());
        assert_eq!(channel.dropped(), 1);
        assert_eq!(channel.try_consume(), Some(StockChange(-1)));
        assert_eq!(channel.try_consume(), Some(StockChange(-2)));
        assert!(channel.is_empty());
    }

    #[test]
    fn unit_capacity_coalesces_restock() {
        let channel = EventChannel::with_capacity(1).unwrap();
        for _ in 0..10 {
            channel.publish(Restock);
        }
        assert_eq!(channel.len(), 1);
        assert_eq!(channel.dropped(), 9);
    }

    #[test]
    fn clones_share_buffer_and_drop_count() {
        let channel = EventChannel::with_capacity(1).unwrap();
        let producer = channel.clone();
        assert!(producer.publish(StockChange::TAKE));
        assert!(!producer.publish(StockChange::TAKE));
        assert_eq!(channel.dropped(), 1);
        assert_eq!(channel.try_consume(), Some(StockChange::TAKE));
    }

    #[test]
    fn consume_receives_from_other_thread() {
        let channel = EventChannel::with_capacity(8).unwrap();
        let shutdown = Shutdown::new();
        let producer = channel.clone();
        let handle = thread::spawn(move || {
            for _ in 0..3 {
                producer.publish(StockChange::TAKE);
            }
        });
        handle.join().unwrap();

        let received: Vec<_> = (0..3).filter_map(|_| channel.consume(&shutdown)).collect();
        assert_eq!(received.len(), 3);
    }

    #[test]
    fn cancellation_unblocks_consumer() {
        let channel = EventChannel::<StockChange>::with_capacity(8).unwrap();
        let shutdown = Shutdown::new();
        let consumer = {
            let channel = channel.clone();
            let shutdown = shutdown.clone();
            thread::spawn(move || channel.consume(&shutdown))
        };

        thread::sleep(Duration::from_millis(20));
        shutdown.cancel();
        assert_eq!(consumer.join().unwrap(), None);
        assert_eq!(channel.consume(&shutdown), None);
    }

    #[test]
    fn consume_timeout_returns_none_when_idle() {
        let channel = EventChannel::<Restock>::with_capacity(1).unwrap();
        assert_eq!(channel.consume_timeout(Duration::from_millis(5)), None);
    }
}
