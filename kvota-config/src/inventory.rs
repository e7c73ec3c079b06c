//! Inventory parameters.
//!
//! Starting stock, the restock threshold and the sizing of the stock change
//! feed and threshold monitor.

use std::time::Duration;

use kvota_core::inventory::InventorySettings;
use serde::{Deserialize, Serialize};
use validator::{self, Validate};

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct InventoryConfig {
    /// Units in stock at startup.
    #[serde(default = "default_initial_stock")]
    pub initial_stock: u64,

    /// Restock is signalled while the level is strictly below this value.
    #[serde(default = "default_restock_threshold")]
    pub restock_threshold: u64,

    /// Buffered stock change events before new ones are dropped.
    #[validate(range(min = 1, max = 65536))]
    #[serde(default = "default_change_capacity")]
    pub change_capacity: usize,

    /// Threshold monitor sampling period (milliseconds).
    #[validate(range(min = 1, max = 60_000))]
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_initial_stock() -> u64 {
    10
}

fn default_restock_threshold() -> u64 {
    5
}

fn default_change_capacity() -> usize {
    kvota_core::signal::DEFAULT_CHANGE_CAPACITY
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            initial_stock: default_initial_stock(),
            restock_threshold: default_restock_threshold(),
            change_capacity: default_change_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl InventoryConfig {
    pub fn to_inventory_settings(&self) -> InventorySettings {
        InventorySettings {
            initial: self.initial_stock,
            threshold: self.restock_threshold,
            change_capacity: self.change_capacity,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_core_defaults() {
        let settings = InventoryConfig::default().to_inventory_settings();
        assert_eq!(settings.change_capacity, 60);
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
        assert_eq!((settings.initial, settings.threshold), (10, 5));
    }

    #[test]
    fn zero_change_capacity_is_invalid() {
        let config = InventoryConfig {
            change_capacity: 0,
            ..InventoryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_poll_interval_is_invalid() {
        let config = InventoryConfig {
            poll_interval_ms: 0,
            ..InventoryConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
