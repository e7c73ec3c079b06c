//! Seat booking and simulation parameters.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Seat table sizing.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct BookingConfig {
    /// Number of seats, numbered `1..=seats`.
    #[validate(range(min = 1, max = 100_000))]
    #[serde(default = "default_seats")]
    pub seats: usize,
}

fn default_seats() -> usize {
    10
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            seats: default_seats(),
        }
    }
}

/// Actor counts and pacing for the `kvota` simulations.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SimulationConfig {
    /// Actors that only read the stock level.
    #[validate(range(max = 10_000))]
    #[serde(default = "default_readers")]
    pub readers: usize,

    /// Actors that try to buy one unit each.
    #[validate(range(max = 10_000))]
    #[serde(default = "default_buyers")]
    pub buyers: usize,

    /// Concurrent users in the booking simulation.
    #[validate(range(min = 1, max = 10_000))]
    #[serde(default = "default_booking_users")]
    pub booking_users: usize,

    /// Time given to background consumers before shutdown (milliseconds).
    #[validate(range(max = 600_000))]
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Upper bound on blocking worker threads.
    #[validate(range(min = 1, max = 1024))]
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Seed for seat selection; 0 draws one from the OS.
    #[serde(default)]
    pub seed: u64,
}

fn default_readers() -> usize {
    9
}

fn default_buyers() -> usize {
    9
}

fn default_booking_users() -> usize {
    5
}

fn default_settle_ms() -> u64 {
    3000
}

fn default_workers() -> usize {
    num_cpus::get().max(2)
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            readers: default_readers(),
            buyers: default_buyers(),
            booking_users: default_booking_users(),
            settle_ms: default_settle_ms(),
            workers: default_workers(),
            seed: 0,
        }
    }
}
