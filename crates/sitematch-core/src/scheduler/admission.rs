//! Semaphore-gated admission: one thread per hostname.

use std::thread;

use crate::aggregate::Aggregator;
use crate::fallback::Checker;

use super::budget::ConcurrencyBudget;
use super::resolve_guarded;

/// Admits hostnames in input order, each only once a slot is free. The slot
/// is released when the hostname's thread finishes, whatever the outcome.
pub(super) fn run_admission(
    hostnames: &[String],
    checker: &Checker<'_>,
    budget: usize,
    aggregator: &Aggregator<'_>,
) {
    let slots = ConcurrencyBudget::new(budget);
    thread::scope(|s| {
        for hostname in hostnames {
            let permit = slots.acquire();
            tracing::trace!(%hostname, in_use = slots.in_use(), max = slots.max(), "admitted");
            s.spawn(move || {
                let _permit = permit;
                aggregator.record(resolve_guarded(checker, hostname));
            });
        }
    });
}
