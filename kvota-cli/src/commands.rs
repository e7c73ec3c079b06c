use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::spawn_blocking;
use tracing::{info, instrument, warn};

use kvota_config::KvotaConfig;
use kvota_core::prelude::{Inventory, ReservationLedger, Shutdown, SlotTable};
use kvota_telemetry::{EventLogger, MetricsRecorder};

use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file (defaults to config/kvota.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print Prometheus metrics on exit
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Concurrent readers and buyers against a shared stock level
    Inventory(InventoryArgs),
    /// Concurrent users booking, paying for and cancelling seats
    Booking(BookingArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct InventoryArgs {
    #[arg(long)]
    pub initial: Option<u64>,
    #[arg(long)]
    pub threshold: Option<u64>,
    #[arg(long)]
    pub readers: Option<usize>,
    #[arg(long)]
    pub buyers: Option<usize>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BookingArgs {
    #[arg(long)]
    pub seats: Option<usize>,
    #[arg(long)]
    pub users: Option<usize>,
    /// Seat selection seed; 0 picks one from the OS
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut KvotaConfig) {
        if self.metrics {
            config.telemetry.metrics = true;
        }
        match &self.command {
            Commands::Inventory(args) => {
                if let Some(initial) = args.initial {
                    config.inventory.initial_stock = initial;
                }
                if let Some(threshold) = args.threshold {
                    config.inventory.restock_threshold = threshold;
                }
                if let Some(readers) = args.readers {
                    config.simulation.readers = readers;
                }
                if let Some(buyers) = args.buyers {
                    config.simulation.buyers = buyers;
                }
            }
            Commands::Booking(args) => {
                if let Some(seats) = args.seats {
                    config.booking.seats = seats;
                }
                if let Some(users) = args.users {
                    config.simulation.booking_users = users;
                }
                if let Some(seed) = args.seed {
                    config.simulation.seed = seed;
                }
            }
        }
    }
}

pub async fn run_command(
    command: &Commands,
    config: &KvotaConfig,
    metrics: MetricsRecorder,
) -> Result<(), CliError> {
    match command {
        Commands::Inventory(_) => run_inventory(config, metrics).await,
        Commands::Booking(_) => run_booking(config, metrics).await,
    }
}

/// Readers log the level, buyers take one unit each. An analytics consumer
/// logs every change and a restock consumer reacts to low-stock signals until
/// the inventory is shut down.
#[instrument(skip_all, fields(initial = config.inventory.initial_stock))]
pub async fn run_inventory(config: &KvotaConfig, metrics: MetricsRecorder) -> Result<(), CliError> {
    let inventory = Arc::new(Inventory::new(config.inventory.to_inventory_settings())?);
    inventory.start()?;
    let _cancel = CancelOnDrop(inventory.shutdown_token());

    let analytics = spawn_consumer("kvota-analytics", {
        let inventory = Arc::clone(&inventory);
        move || {
            let token = inventory.shutdown_token();
            while let Some(change) = inventory.changes().consume(&token) {
                EventLogger::stock_change(change.delta());
            }
        }
    })?;

    let restocker = spawn_consumer("kvota-restock", {
        let inventory = Arc::clone(&inventory);
        let metrics = metrics.clone();
        move || {
            let token = inventory.shutdown_token();
            while inventory.restocks().consume(&token).is_some() {
                metrics.record_restock();
                info!(level = inventory.level(), "Triggering restock process");
            }
        }
    })?;

    let sim = &config.simulation;
    let mut actors = Vec::with_capacity(sim.readers + sim.buyers);
    for i in 0..sim.readers.max(sim.buyers) {
        if i < sim.readers {
            let inventory = Arc::clone(&inventory);
            actors.push(spawn_blocking(move || {
                EventLogger::stock_level(&format!("reader-{}", i + 1), inventory.level());
            }));
        }
        if i < sim.buyers {
            let inventory = Arc::clone(&inventory);
            let metrics = metrics.clone();
            actors.push(spawn_blocking(move || {
                let buyer = format!("buyer-{}", i + 1);
                let ok = inventory.add_to_cart();
                metrics.record_take(ok);
                if ok {
                    inventory.confirm_order(1);
                    info!(buyer, "Item added to cart and order confirmed");
                } else {
                    info!(buyer, "Failed to add to cart: out of stock");
                }
            }));
        }
    }

    for actor in actors {
        actor.await?;
    }

    tokio::time::sleep(Duration::from_millis(sim.settle_ms)).await;

    let level = inventory.level();
    let dropped = inventory.changes().dropped();
    metrics.observe_stock(level, dropped);
    if dropped > 0 {
        warn!(dropped, "Stock change events were dropped");
    }
    info!(level, "Final inventory");

    inventory.shutdown();
    join_consumer("kvota-analytics", analytics)?;
    join_consumer("kvota-restock", restocker)?;
    Ok(())
}

/// Each user looks at the free seats, books a random one and then either pays
/// or cancels with equal odds.
#[instrument(skip_all, fields(seats = config.booking.seats))]
pub async fn run_booking(config: &KvotaConfig, metrics: MetricsRecorder) -> Result<(), CliError> {
    let table = Arc::new(SlotTable::new(config.booking.seats)?);
    let ledger = Arc::new(ReservationLedger::new(table));
    let seed = config.simulation.seed;

    let users: Vec<_> = (0..config.simulation.booking_users)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            let metrics = metrics.clone();
            let user = format!("user-{}", i + 1);
            let rng = if seed == 0 {
                StdRng::from_os_rng()
            } else {
                StdRng::seed_from_u64(seed.wrapping_add(i as u64))
            };
            spawn_blocking(move || simulate_user(&user, &ledger, &metrics, rng))
        })
        .collect();

    for user in users {
        user.await?;
    }

    let records = ledger.records();
    let paid = records.iter().filter(|r| r.is_paid()).count();
    info!(
        available = ?ledger.available_indices(),
        reservations = records.len(),
        paid,
        "Booking finished"
    );
    Ok(())
}

fn simulate_user(user: &str, ledger: &ReservationLedger, metrics: &MetricsRecorder, mut rng: StdRng) {
    let seats = ledger.available_indices();
    info!(user, ?seats, "Available seats");

    if !seats.is_empty() {
        let seat = seats[rng.random_range(0..seats.len())];
        let booked = ledger.reserve(seat);
        metrics.record_seat("book", booked);
        EventLogger::seat_action(user, "book", seat, booked);

        if booked {
            let (action, ok) = if rng.random_bool(0.5) {
                ("pay", ledger.pay(seat))
            } else {
                ("cancel", ledger.cancel(seat))
            };
            metrics.record_seat(action, ok);
            EventLogger::seat_action(user, action, seat, ok);
        }
    }

    let seats = ledger.available_indices();
    info!(user, ?seats, "Available seats after booking");
}

fn spawn_consumer<F>(name: &'static str, body: F) -> Result<JoinHandle<()>, CliError>
where
    F: FnOnce() + Send + 'static,
{
    Ok(thread::Builder::new().name(name.into()).spawn(body)?)
}

/// Cancels the token when dropped. Consumer threads hold their own
/// `Arc<Inventory>`, so an early return would otherwise leave them blocked.
struct CancelOnDrop(Shutdown);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

fn join_consumer(name: &'static str, handle: JoinHandle<()>) -> Result<(), CliError> {
    handle.join().map_err(|_| CliError::ConsumerPanicked(name))
}
