//! Fixed worker pool over a shared hostname queue.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::thread;

use crate::aggregate::Aggregator;
use crate::fallback::Checker;

use super::resolve_guarded;

/// Runs `min(budget, n)` workers; each pops the next hostname in input order
/// until the queue is empty. Returns once every worker has exited.
pub(super) fn run_pool(
    hostnames: &[String],
    checker: &Checker<'_>,
    budget: usize,
    aggregator: &Aggregator<'_>,
) {
    let work: Mutex<VecDeque<&str>> = Mutex::new(hostnames.iter().map(String::as_str).collect());
    let num_workers = budget.min(hostnames.len());
    thread::scope(|s| {
        for _ in 0..num_workers {
            let work = &work;
            s.spawn(move || loop {
                let next = work
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                let Some(hostname) = next else {
                    break;
                };
                aggregator.record(resolve_guarded(checker, hostname));
            });
        }
    });
}
