//! ## kvota-core::ledger
//! **Reservation records with a payment sub-state**
//!
//! Two locks, never nested: the table's lock lives entirely inside each
//! [`SlotTable`] call, and the ledger's own lock is only taken after that call
//! has returned.
//!
//! `cancel` releases the slot first and then drops *unpaid* records for it. A
//! paid record survives cancellation even though its slot is now free and can
//! be booked again by someone else. See DESIGN.md, "Paid seat cancellation".

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::Rejection;
use crate::table::SlotTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReservationState {
    Active,
    Paid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub index: usize,
    pub state: ReservationState,
}

impl Reservation {
    fn active(index: usize) -> Self {
        Self {
            index,
            state: ReservationState::Active,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.state == ReservationState::Paid
    }
}

#[derive(Debug)]
pub struct ReservationLedger {
    table: Arc<SlotTable>,
    records: Mutex<Vec<Reservation>>,
}

impl ReservationLedger {
    pub fn new(table: Arc<SlotTable>) -> Self {
        Self {
            table,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn table(&self) -> &Arc<SlotTable> {
        &self.table
    }

    pub fn reserve(&self, index: usize) -> bool {
        self.book(index).is_ok()
    }

    pub fn cancel(&self, index: usize) -> bool {
        self.release(index).is_ok()
    }

    pub fn pay(&self, index: usize) -> bool {
        self.settle(index).is_ok()
    }

    pub fn available_indices(&self) -> Vec<usize> {
        self.table.available_indices()
    }

    /// Reserves the slot and opens an active record for it.
    pub fn book(&self, index: usize) -> Result<(), Rejection> {
        self.table.reserve_slot(index)?;
        self.records.lock().push(Reservation::active(index));
        debug!(index, "Reservation opened");
        Ok(())
    }

    /// Frees the slot and removes unpaid records for it.
    ///
    /// Succeeds whenever the slot release succeeds, including when the only
    /// record for the slot is paid and therefore kept.
    pub fn release(&self, index: usize) -> Result<(), Rejection> {
        self.table.release_slot(index)?;
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| r.index != index || r.is_paid());
        if records.len() == before {
            debug!(index, "Slot released, paid record kept");
        } else {
            debug!(index, "Reservation cancelled");
        }
        Ok(())
    }

    /// Marks the active record for `index` as paid.
    pub fn settle(&self, index: usize) -> Result<(), Rejection> {
        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|r| r.index == index && !r.is_paid())
            .ok_or_else(|| {
                trace!(index, "No unpaid reservation to settle");
                Rejection::Conflict
            })?;
        record.state = ReservationState::Paid;
        debug!(index, "Reservation paid");
        Ok(())
    }

    /// Most recent record for `index`, if any.
    pub fn record(&self, index: usize) -> Option<Reservation> {
        self.records
            .lock()
            .iter()
            .rev()
            .find(|r| r.index == index)
            .copied()
    }

    pub fn records(&self) -> Vec<Reservation> {
        self.records.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn ledger(size: usize) -> ReservationLedger {
        ReservationLedger::new(Arc::new(SlotTable::new(size).unwrap()))
    }

    #[test]
    fn reserve_opens_active_record() {
        let ledger = ledger(10);
        assert!(ledger.reserve(1));
        assert!(!ledger.reserve(1));
        assert_eq!(
            ledger.record(1),
            Some(Reservation {
                index: 1,
                state: ReservationState::Active
            })
        );
        assert_eq!(ledger.records().len(), 1);
    }

    #[test]
    fn out_of_range_reserve_leaves_no_record() {
        let ledger = ledger(10);
        assert!(!ledger.reserve(0));
        assert!(!ledger.reserve(11));
        assert_eq!(ledger.book(11), Err(Rejection::OutOfRange));
        assert!(ledger.records().is_empty());
    }

    #[test]
    fn cancel_twice_succeeds_once() {
        let ledger = ledger(10);
        ledger.reserve(1);
        assert!(ledger.cancel(1));
        assert!(!ledger.cancel(1));
        assert_eq!(ledger.record(1), None);
        assert_eq!(ledger.available_indices().len(), 10);
    }

    #[test]
    fn pay_twice_succeeds_once() {
        let ledger = ledger(10);
        ledger.reserve(1);
        assert!(ledger.pay(1));
        assert!(!ledger.pay(1));
        assert_eq!(ledger.settle(1), Err(Rejection::Conflict));
    }

    #[test]
    fn pay_without_reservation_fails() {
        let ledger = ledger(10);
        assert!(!ledger.pay(3));
        assert!(!ledger.pay(42));
    }

    #[test]
    fn paid_record_survives_cancel() {
        let ledger = ledger(10);
        ledger.reserve(2);
        ledger.pay(2);

        assert!(ledger.cancel(2));
        assert!(ledger.available_indices().contains(&2));
        assert!(ledger.record(2).is_some_and(|r| r.is_paid()));
    }

    #[test]
    fn freed_paid_slot_can_be_rebooked() {
        let ledger = ledger(10);
        ledger.reserve(2);
        ledger.pay(2);
        ledger.cancel(2);

        assert!(ledger.reserve(2));
        assert_eq!(ledger.records().len(), 2);
        assert_eq!(ledger.record(2).map(|r| r.state), Some(ReservationState::Active));
        assert!(ledger.pay(2));
    }

    #[test]
    fn concurrent_bookings_single_winner() {
        let ledger = Arc::new(ledger(10));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || ledger.reserve(1))
            })
            .chain(std::iter::once({
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || ledger.cancel(2))
            }))
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let available = ledger.available_indices();
        assert_eq!(available.len(), 9);
        assert!(!available.contains(&1));
        assert_eq!(ledger.records().len(), 1);
    }
}
