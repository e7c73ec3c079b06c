//! # kvota Telemetry
//!
//! Logging subscriber setup and Prometheus metrics for the `kvota` binaries.
//! The core crate only emits `tracing` events; everything here belongs to the
//! process that drives it.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
