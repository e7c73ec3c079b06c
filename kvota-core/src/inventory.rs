//! ## kvota-core::inventory
//! **Stock counter with change feed and low-stock monitor**
//!
//! An [`Inventory`] is built once, shared by reference (usually behind an
//! `Arc`), and shut down explicitly. It owns:
//! - the lock-free [`StockCounter`],
//! - a drop-on-full [`StockChange`] feed for analytics consumers,
//! - a coalescing [`Restock`] feed fed by the [`ThresholdMonitor`],
//! - the [`Shutdown`] token that stops the monitor and any consumer loops
//!   that were handed the same token.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::counter::StockCounter;
use crate::error::CoreError;
use crate::monitor::{MonitorHandle, ThresholdMonitor, DEFAULT_POLL_INTERVAL};
use crate::shutdown::Shutdown;
use crate::signal::{EventChannel, Restock, StockChange, DEFAULT_CHANGE_CAPACITY};

#[derive(Clone, Debug)]
pub struct InventorySettings {
    pub initial: u64,
    pub threshold: u64,
    pub change_capacity: usize,
    pub poll_interval: Duration,
}

impl InventorySettings {
    pub fn new(initial: u64, threshold: u64) -> Self {
        Self {
            initial,
            threshold,
            change_capacity: DEFAULT_CHANGE_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

pub struct Inventory {
    counter: Arc<StockCounter>,
    changes: EventChannel<StockChange>,
    restocks: EventChannel<Restock>,
    monitor: ThresholdMonitor,
    running: Mutex<Option<MonitorHandle>>,
    shutdown: Shutdown,
}

impl Inventory {
    pub fn new(settings: InventorySettings) -> Result<Self, CoreError> {
        let counter = Arc::new(StockCounter::new(settings.initial));
        let changes = EventChannel::with_capacity(settings.change_capacity)?;
        let restocks = EventChannel::with_capacity(1)?;
        let monitor = ThresholdMonitor::new(
            Arc::clone(&counter),
            settings.threshold,
            restocks.clone(),
            settings.poll_interval,
        )?;

        Ok(Self {
            counter,
            changes,
            restocks,
            monitor,
            running: Mutex::new(None),
            shutdown: Shutdown::new(),
        })
    }

    /// Starts the threshold monitor. Calling it again while running, or after
    /// shutdown, does nothing.
    pub fn start(&self) -> Result<(), CoreError> {
        let mut running = self.running.lock();
        if running.is_some() || self.shutdown.is_cancelled() {
            return Ok(());
        }
        *running = Some(self.monitor.spawn(self.shutdown.clone())?);
        Ok(())
    }

    /// Takes one unit and reports the change. `false` when out of stock.
    pub fn add_to_cart(&self) -> bool {
        match self.counter.take() {
            Ok(left) => {
                trace!(left, "Stock taken");
                self.changes.publish(StockChange::TAKE);
                true
            }
            Err(_) => false,
        }
    }

    /// Returns one unit and reports the change.
    pub fn remove_from_cart(&self) {
        self.counter.increment();
        self.changes.publish(StockChange::RETURN);
    }

    /// Order confirmation is handled outside the core; this only records it.
    pub fn confirm_order(&self, quantity: u64) {
        trace!(quantity, "Order confirmed");
    }

    pub fn level(&self) -> u64 {
        self.counter.read()
    }

    pub fn threshold(&self) -> u64 {
        self.monitor.threshold()
    }

    pub fn counter(&self) -> &Arc<StockCounter> {
        &self.counter
    }

    pub fn changes(&self) -> &EventChannel<StockChange> {
        &self.changes
    }

    pub fn restocks(&self) -> &EventChannel<Restock> {
        &self.restocks
    }

    pub fn monitor(&self) -> &ThresholdMonitor {
        &self.monitor
    }

    /// Token for consumer loops that should stop together with the inventory.
    pub fn shutdown_token(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Cancels background work and waits for the monitor thread.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        if let Some(handle) = self.running.lock().take() {
            if handle.join().is_err() {
                warn!("Threshold monitor panicked");
            }
        }
        debug!(level = self.level(), "Inventory shut down");
    }
}

impl Drop for Inventory {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inventory")
            .field("level", &self.level())
            .field("threshold", &self.threshold())
            .field("changes", &self.changes)
            .field("restocks", &self.restocks)
            .finish()
    }
}
