//! # kvota-core
//!
//! Concurrency kernel for bounded resource pools: a stock level many buyers
//! draw from, and a fixed table of seats many users book, pay and cancel.
//!
//! ### Guarantees:
//! - Stock never drops below zero; every take and return is accounted for
//! - A seat is never held by two reservations at once
//! - Notification producers never block on a full channel
//! - Background loops stop promptly on cancellation
//!
//! ### Key Submodules:
//! - `counter`: lock-free stock level (CAS decrement)
//! - `signal`: bounded, drop-on-full event channels
//! - `monitor`: periodic low-stock sampler raising coalesced restock signals
//! - `table`: single-lock seat table
//! - `ledger`: reservation records with payment state on top of the table
//! - `inventory`: counter + feeds + monitor with an explicit lifetime
//! - `shutdown`: cooperative cancellation token

pub mod counter;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod monitor;
pub mod shutdown;
pub mod signal;
pub mod table;

pub mod prelude {
    pub use crate::counter::StockCounter;
    pub use crate::error::{CoreError, Rejection};
    pub use crate::inventory::{Inventory, InventorySettings};
    pub use crate::ledger::{Reservation, ReservationLedger, ReservationState};
    pub use crate::monitor::{MonitorHandle, MonitorState, ThresholdMonitor};
    pub use crate::shutdown::Shutdown;
    pub use crate::signal::{EventChannel, Restock, StockChange};
    pub use crate::table::{SlotState, SlotTable};
}

pub use error::{CoreError, Rejection};
