//! ## kvota-core::monitor
//! **Periodic low-stock sampler**
//!
//! ```text
//! Idle --(level < threshold)--> SignalPending --(signal consumed)--> Idle
//! ```
//!
//! The monitor samples the counter on a fixed interval; it does not react to
//! individual mutations. A level that dips below the threshold and recovers
//! between two samples goes unnoticed. Raises go through a capacity-1 channel,
//! so breaches observed while a signal is still pending collapse into it.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::counter::StockCounter;
use crate::error::CoreError;
use crate::shutdown::Shutdown;
use crate::signal::{EventChannel, Restock};

/// Default sampling period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    SignalPending,
}

#[derive(Clone, Debug)]
pub struct ThresholdMonitor {
    counter: Arc<StockCounter>,
    threshold: u64,
    restocks: EventChannel<Restock>,
    poll_interval: Duration,
}

impl ThresholdMonitor {
    pub fn new(
        counter: Arc<StockCounter>,
        threshold: u64,
        restocks: EventChannel<Restock>,
        poll_interval: Duration,
    ) -> Result<Self, CoreError> {
        if poll_interval.is_zero() {
            return Err(CoreError::ZeroPollInterval);
        }
        Ok(Self {
            counter,
            threshold,
            restocks,
            poll_interval,
        })
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn state(&self) -> MonitorState {
        if self.restocks.is_empty() {
            MonitorState::Idle
        } else {
            MonitorState::SignalPending
        }
    }

    /// Offers a restock signal without blocking. `false` means one was
    /// already pending and this raise was coalesced into it.
    pub fn try_raise(&self) -> bool {
        self.restocks.publish(Restock)
    }

    /// One sampling step. Returns `true` if a new signal became pending.
    pub fn sample(&self) -> bool {
        let level = self.counter.read();
        if level >= self.threshold {
            return false;
        }
        let raised = self.try_raise();
        if raised {
            debug!(level, threshold = self.threshold, "Stock below threshold, restock raised");
        } else {
            trace!(level, "Restock already pending");
        }
        raised
    }

    /// Runs the sampling loop on a dedicated thread until `shutdown` fires.
    pub fn spawn(&self, shutdown: Shutdown) -> Result<MonitorHandle, CoreError> {
        let monitor = self.clone();
        let handle = thread::Builder::new()
            .name("kvota-monitor".into())
            .spawn(move || monitor.run(&shutdown))?;
        Ok(MonitorHandle { handle })
    }

    fn run(&self, shutdown: &Shutdown) {
        info!(
            threshold = self.threshold,
            interval_ms = self.poll_interval.as_millis() as u64,
            "Threshold monitor started"
        );
        while !shutdown.is_cancelled() {
            self.sample();
            if shutdown.wait_timeout(self.poll_interval) {
                break;
            }
        }
        info!("Threshold monitor stopped");
    }
}

/// Join handle of a running monitor thread.
#[derive(Debug)]
pub struct MonitorHandle {
    handle: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the loop to exit. Cancel its shutdown token first.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn monitor(level: u64, threshold: u64) -> (Arc<StockCounter>, ThresholdMonitor) {
        let counter = Arc::new(StockCounter::new(level));
        let restocks = EventChannel::with_capacity(1).unwrap();
        let monitor = ThresholdMonitor::new(
            Arc::clone(&counter),
            threshold,
            restocks,
            Duration::from_millis(5),
        )
        .unwrap();
        (counter, monitor)
    }

    #[test]
    fn rejects_zero_interval() {
        let counter = Arc::new(StockCounter::new(1));
        let restocks = EventChannel::with_capacity(1).unwrap();
        assert!(matches!(
            ThresholdMonitor::new(counter, 1, restocks, Duration::ZERO),
            Err(CoreError::ZeroPollInterval)
        ));
    }

    #[test]
    fn stays_idle_at_or_above_threshold() {
        let (_, monitor) = monitor(5, 5);
        assert!(!monitor.sample());
        assert_eq!(monitor.state(), MonitorState::Idle);
    }

    #[test]
    fn repeated_breaches_coalesce() {
        let (counter, monitor) = monitor(3, 5);
        assert!(monitor.sample());
        assert_eq!(monitor.state(), MonitorState::SignalPending);

        counter.try_decrement();
        for _ in 0..10 {
            assert!(!monitor.sample());
        }
        assert_eq!(monitor.restocks.len(), 1);

        assert_eq!(monitor.restocks.try_consume(), Some(Restock));
        assert_eq!(monitor.state(), MonitorState::Idle);
        assert!(monitor.sample());
    }

    #[test]
    fn background_loop_raises_and_stops() {
        let (_, monitor) = monitor(0, 1);
        let shutdown = Shutdown::new();
        let handle = monitor.spawn(shutdown.clone()).unwrap();

        assert_eq!(
            monitor.restocks.consume_timeout(Duration::from_secs(5)),
            Some(Restock)
        );

        let stopped = Instant::now();
        shutdown.cancel();
        handle.join().unwrap();
        assert!(stopped.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn cancelled_before_spawn_exits_without_sampling() {
        let (_, monitor) = monitor(0, 1);
        let shutdown = Shutdown::new();
        shutdown.cancel();
        monitor.spawn(shutdown).unwrap().join().unwrap();
        assert_eq!(monitor.state(), MonitorState::Idle);
    }
}
