//! ## kvota-telemetry::metrics
//! **Prometheus counters for stock and seat activity**
//!
//! One registry per recorder. Clones share the same underlying counters, so a
//! recorder can be handed to every actor.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub stock_taken: IntCounter,
    pub stock_rejected: IntCounter,
    pub stock_returned: IntCounter,
    pub stock_level: IntGauge,
    pub changes_dropped: IntGauge,
    pub restock_signals: IntCounter,
    pub seat_actions: IntCounterVec,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let stock_taken = IntCounter::new("kvota_stock_taken_total", "Units taken from stock")?;
        let stock_rejected = IntCounter::new(
            "kvota_stock_rejected_total",
            "Take attempts rejected because stock was exhausted",
        )?;
        let stock_returned =
            IntCounter::new("kvota_stock_returned_total", "Units returned to stock")?;
        let stock_level = IntGauge::new("kvota_stock_level", "Last observed stock level")?;
        let changes_dropped = IntGauge::new(
            "kvota_changes_dropped",
            "Stock change events dropped on a full feed",
        )?;
        let restock_signals = IntCounter::new(
            "kvota_restock_signals_total",
            "Restock signals consumed",
        )?;
        let seat_actions = IntCounterVec::new(
            Opts::new("kvota_seat_actions_total", "Seat operations by action and outcome"),
            &["action", "outcome"],
        )?;

        registry.register(Box::new(stock_taken.clone()))?;
        registry.register(Box::new(stock_rejected.clone()))?;
        registry.register(Box::new(stock_returned.clone()))?;
        registry.register(Box::new(stock_level.clone()))?;
        registry.register(Box::new(changes_dropped.clone()))?;
        registry.register(Box::new(restock_signals.clone()))?;
        registry.register(Box::new(seat_actions.clone()))?;

        Ok(Self {
            registry,
            stock_taken,
            stock_rejected,
            stock_returned,
            stock_level,
            changes_dropped,
            restock_signals,
            seat_actions,
        })
    }

    pub fn record_take(&self, ok: bool) {
        if ok {
            self.stock_taken.inc();
        } else {
            self.stock_rejected.inc();
        }
    }

    pub fn record_return(&self) {
        self.stock_returned.inc();
    }

    pub fn observe_stock(&self, level: u64, dropped_changes: u64) {
        self.stock_level.set(i64::try_from(level).unwrap_or(i64::MAX));
        self.changes_dropped
            .set(i64::try_from(dropped_changes).unwrap_or(i64::MAX));
    }

    pub fn record_restock(&self) {
        self.restock_signals.inc();
    }

    /// `action` is one of `book`, `pay`, `cancel`.
    pub fn record_seat(&self, action: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "rejected" };
        self.seat_actions.with_label_values(&[action, outcome]).inc();
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
