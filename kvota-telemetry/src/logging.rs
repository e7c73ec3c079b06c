//! ## kvota-telemetry::logging
//! **Structured logging with `tracing`**
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to every
//! target. Thread names are included so actor and monitor output can be told
//! apart.

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. Later calls are ignored.
    pub fn init(default_level: &str) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let _ = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .try_init();
    }

    /// Logs a stock level observation from a reader actor.
    pub fn stock_level(actor: &str, level: u64) {
        info!(actor, level, "Current inventory");
    }

    /// Logs one delta drained from the stock change feed.
    pub fn stock_change(delta: i64) {
        info!(delta, "Inventory change");
    }

    /// Logs a seat booking step taken by a user.
    pub fn seat_action(user: &str, action: &str, seat: usize, ok: bool) {
        info!(user, action, seat, ok, "Seat action");
    }
}
