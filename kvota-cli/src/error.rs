use kvota_config::ConfigError;
use kvota_core::CoreError;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Actor task failed: {0}")]
    Join(#[from] JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background consumer '{0}' panicked")]
    ConsumerPanicked(&'static str),
}
