//! Counting semaphore bounding in-flight resolutions.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// At most `max` permits are out at once. `acquire` blocks until one is free;
/// a permit is returned when its `Permit` guard is dropped.
#[derive(Debug)]
pub struct ConcurrencyBudget {
    max: usize,
    in_use: Mutex<usize>,
    freed: Condvar,
}

impl ConcurrencyBudget {
    /// Create a budget of `max` slots (at least 1).
    pub fn new(max: usize) -> Self {
        Self {
            max: max.max(1),
            in_use: Mutex::new(0),
            freed: Condvar::new(),
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.in_use.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of permits currently held.
    pub fn in_use(&self) -> usize {
        *self.lock()
    }

    /// Blocks until a slot is free, then takes it.
    pub fn acquire(&self) -> Permit<'_> {
        let mut in_use = self.lock();
        while *in_use >= self.max {
            in_use = self
                .freed
                .wait(in_use)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *in_use += 1;
        Permit { budget: self }
    }

    fn release(&self) {
        let mut in_use = self.lock();
        *in_use = in_use.saturating_sub(1);
        drop(in_use);
        self.freed.notify_one();
    }
}

/// Releases its slot when dropped.
#[derive(Debug)]
pub struct Permit<'a> {
    budget: &'a ConcurrencyBudget,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.budget.release();
    }
}
