//! ## kvota-core::counter
//! **Lock-free stock counter**
//!
//! A single `AtomicU64` mutated only through compare-and-swap (conditional
//! take) and `fetch_add` (return). The level can never be observed below zero.
//!
//! ### Complexity
//! - `try_decrement`: O(1) uncontended, O(k) under k concurrent takers. Each
//!   failed CAS retries with the observed value, so the loop is lock-free.
//! - `increment` / `read`: single atomic instruction.

use std::hint::spin_loop;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Rejection;

/// Cache-line aligned atomic to keep the hot counter off neighbouring lines.
#[repr(align(64))]
#[derive(Debug)]
struct AlignedLevel(AtomicU64);

/// Shared stock level with a non-negative invariant.
#[derive(Debug)]
pub struct StockCounter {
    level: AlignedLevel,
}

impl StockCounter {
    pub fn new(initial: u64) -> Self {
        Self {
            level: AlignedLevel(AtomicU64::new(initial)),
        }
    }

    /// Takes one unit if any is left.
    ///
    /// Fails only when the level observed at the moment of the check is zero;
    /// losing a CAS race to another writer retries instead of failing.
    #[inline]
    pub fn try_decrement(&self) -> bool {
        self.take().is_ok()
    }

    /// Same as [`try_decrement`](Self::try_decrement), returning the level left
    /// after a successful take.
    pub fn take(&self) -> Result<u64, Rejection> {
        let mut current = self.level.0.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return Err(Rejection::Exhausted);
            }

            match self.level.0.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(current - 1),
                Err(observed) => {
                    current = observed;
                    spin_loop();
                }
            }
        }
    }

    /// Returns one unit. Always succeeds.
    #[inline]
    pub fn increment(&self) {
        self.level.0.fetch_add(1, Ordering::AcqRel);
    }

    /// Snapshot of the current level. May be stale as soon as it returns.
    #[inline]
    pub fn read(&self) -> u64 {
        self.level.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn decrement_stops_at_zero() {
        let counter = StockCounter::new(2);
        assert!(counter.try_decrement());
        assert!(counter.try_decrement());
        assert!(!counter.try_decrement());
        assert_eq!(counter.read(), 0);
        assert_eq!(counter.take(), Err(Rejection::Exhausted));
    }

    #[test]
    fn increment_after_exhaustion_allows_take() {
        let counter = StockCounter::new(0);
        assert!(!counter.try_decrement());
        counter.increment();
        assert_eq!(counter.take(), Ok(0));
    }

    #[test]
    fn concurrent_buyers_conserve_stock() {
        const INITIAL: u64 = 1000;
        const THREADS: usize = 100;
        const OPS: usize = 100;

        let counter = Arc::new(StockCounter::new(INITIAL));
        let successes = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let counter = Arc::clone(&counter);
                let successes = Arc::clone(&successes);
                let failures = Arc::clone(&failures);
                thread::spawn(move || {
                    for op in 0..OPS {
                        if counter.try_decrement() {
                            successes.fetch_add(1, Ordering::Relaxed);
                        } else {
                            failures.fetch_add(1, Ordering::Relaxed);
                        }
                        if op % 2 == 0 {
                            counter.increment();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let increments = (THREADS * OPS / 2) as u64;
        let successes = successes.load(Ordering::Relaxed) as u64;
        assert_eq!(INITIAL + increments - successes, counter.read());
        assert!(failures.load(Ordering::Relaxed) > 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Take,
        Return,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Take), Just(Op::Return)]
    }

    proptest! {
        #[test]
        fn level_matches_sequential_model(
            initial in 0u64..50,
            ops in proptest::collection::vec(op_strategy(), 0..200),
        ) {
            let counter = StockCounter::new(initial);
            let mut model = initial;
            for op in ops {
                match op {
                    Op::Take => {
                        let expected = model > 0;
                        prop_assert_eq!(counter.try_decrement(), expected);
                        if expected {
                            model -= 1;
                        }
                    }
                    Op::Return => {
                        counter.increment();
                        model += 1;
                    }
                }
                prop_assert_eq!(counter.read(), model);
            }
        }
    }
}
