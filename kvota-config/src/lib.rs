//! # kvota Configuration System
//!
//! Layered configuration for the `kvota` binaries. The core crate never reads
//! configuration itself; the driver loads a [`KvotaConfig`] and hands the
//! relevant pieces to the core constructors.
//!
//! ## Layers (later wins)
//! 1. Built-in defaults
//! 2. `config/kvota.yaml`
//! 3. `config/<KVOTA_ENV>.yaml`
//! 4. `KVOTA_*` environment variables, `__` separating nested keys
//!    (`KVOTA_INVENTORY__INITIAL_STOCK=100`)

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod booking;
mod error;
mod inventory;
mod telemetry;
mod validation;

pub use booking::BookingConfig;
pub use booking::SimulationConfig;
pub use error::ConfigError;
pub use inventory::InventoryConfig;
pub use telemetry::TelemetryConfig;

const BASE_FILE: &str = "config/kvota.yaml";
const ENV_PREFIX: &str = "KVOTA_";

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct KvotaConfig {
    /// Stock level, restock threshold, feed sizing.
    #[validate(nested)]
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Seat table sizing.
    #[validate(nested)]
    #[serde(default)]
    pub booking: BookingConfig,

    /// Actor counts for the simulations.
    #[validate(nested)]
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Logging and metrics.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl KvotaConfig {
    /// Load configuration from default files and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(KvotaConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        }

        if let Ok(env) = std::env::var("KVOTA_ENV") {
            let env_file = format!("config/{}.yaml", env);
            if Path::new(&env_file).exists() {
                figment = figment.merge(Yaml::file(env_file));
            }
        }

        Self::extract(figment)
    }

    /// Load configuration from a specific file, still honoring `KVOTA_*`
    /// overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment =
            Figment::from(Serialized::defaults(KvotaConfig::default())).merge(Yaml::file(path));
        Self::extract(figment)
    }

    /// Re-validates after programmatic overrides (e.g. CLI flags).
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Ok(())
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
