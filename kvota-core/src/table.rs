//! ## kvota-core::table
//! **Fixed-size slot table under a single lock**
//!
//! One mutex guards every slot. Single-slot operations hold it for O(1), the
//! availability scan for O(N). Bounds are checked before the lock is taken.
//! Slot indices are 1-based.

use parking_lot::Mutex;
use tracing::trace;

use crate::error::{CoreError, Rejection};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    Free,
    Reserved,
}

#[derive(Debug)]
pub struct SlotTable {
    slots: Mutex<Vec<SlotState>>,
    size: usize,
}

impl SlotTable {
    pub fn new(size: usize) -> Result<Self, CoreError> {
        if size == 0 {
            return Err(CoreError::EmptyTable);
        }
        Ok(Self {
            slots: Mutex::new(vec![SlotState::Free; size]),
            size,
        })
    }

    pub fn len(&self) -> usize {
        self.size
    }

    /// Always `false`: construction rejects empty tables.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Ascending 1-based indices of free slots, as of one locked scan.
    pub fn available_indices(&self) -> Vec<usize> {
        let slots = self.slots.lock();
        slots
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == SlotState::Free)
            .map(|(i, _)| i + 1)
            .collect()
    }

    pub fn available_count(&self) -> usize {
        let slots = self.slots.lock();
        slots.iter().filter(|state| **state == SlotState::Free).count()
    }

    pub fn state(&self, index: usize) -> Option<SlotState> {
        let offset = self.offset(index).ok()?;
        Some(self.slots.lock()[offset])
    }

    pub fn try_reserve(&self, index: usize) -> bool {
        self.reserve_slot(index).is_ok()
    }

    pub fn try_release(&self, index: usize) -> bool {
        self.release_slot(index).is_ok()
    }

    /// Free -> Reserved.
    pub fn reserve_slot(&self, index: usize) -> Result<(), Rejection> {
        self.transition(index, SlotState::Free, SlotState::Reserved)
    }

    /// Reserved -> Free.
    pub fn release_slot(&self, index: usize) -> Result<(), Rejection> {
        self.transition(index, SlotState::Reserved, SlotState::Free)
    }

    fn transition(&self, index: usize, from: SlotState, to: SlotState) -> Result<(), Rejection> {
        let offset = self.offset(index)?;
        let mut slots = self.slots.lock();
        if slots[offset] != from {
            trace!(index, state = ?slots[offset], "Slot transition rejected");
            return Err(Rejection::Conflict);
        }
        slots[offset] = to;
        trace!(index, state = ?to, "Slot transitioned");
        Ok(())
    }

    #[inline]
    fn offset(&self, index: usize) -> Result<usize, Rejection> {
        if index == 0 || index > self.size {
            return Err(Rejection::OutOfRange);
        }
        Ok(index - 1)
    }
}
