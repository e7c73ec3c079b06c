//! ## kvota-cli
//! **Simulation driver for the kvota concurrency kernel**
//!
//! `kvota inventory` runs concurrent readers and buyers against a shared stock
//! level with analytics and restock consumers attached. `kvota booking` runs
//! concurrent users through book, pay and cancel on a seat table.

use clap::Parser;
use kvota_config::KvotaConfig;
use kvota_telemetry::logging::EventLogger;
use kvota_telemetry::metrics::MetricsRecorder;

mod commands;
mod error;

use commands::Cli;
use error::CliError;

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => KvotaConfig::load_from_path(path)?,
        None => KvotaConfig::load()?,
    };
    cli.apply(&mut config);
    config.check()?;

    EventLogger::init(&config.telemetry.log_level);
    let metrics = MetricsRecorder::new()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(config.simulation.workers)
        .build()?;
    runtime.block_on(commands::run_command(&cli.command, &config, metrics.clone()))?;

    if config.telemetry.metrics {
        println!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}
