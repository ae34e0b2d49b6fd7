//! Concurrency controller.
//!
//! Runs the fallback policy for every hostname with at most `budget`
//! resolutions in flight. Two strategies:
//! - `Pool`: fixed pool of `min(budget, n)` workers pulling from a shared queue.
//! - `Admission`: one thread per hostname, admitted in input order once a slot
//!   of the counting semaphore frees up.
//!
//! Both use scoped threads, so every call returns only after all work has
//! finished and every hostname has recorded exactly one outcome.

mod admission;
mod batch;
mod budget;
mod pool;

pub use batch::partition;
pub use budget::{ConcurrencyBudget, Permit};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use crate::aggregate::{Aggregator, Outcome, Summary};
use crate::fallback::Checker;

/// How hostnames are scheduled onto threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Pool,
    Admission,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Pool => f.write_str("pool"),
            Strategy::Admission => f.write_str("admission"),
        }
    }
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pool" => Ok(Strategy::Pool),
            "admission" => Ok(Strategy::Admission),
            other => anyhow::bail!("unknown strategy {:?} (expected \"pool\" or \"admission\")", other),
        }
    }
}

/// Resolves every hostname and records each outcome into `aggregator`.
/// Returns after all resolutions have completed.
pub fn run_all(
    hostnames: &[String],
    checker: &Checker<'_>,
    budget: usize,
    strategy: Strategy,
    aggregator: &Aggregator<'_>,
) {
    if hostnames.is_empty() {
        return;
    }
    let budget = budget.max(1);
    tracing::debug!(count = hostnames.len(), budget, %strategy, "resolving hostnames");
    match strategy {
        Strategy::Pool => pool::run_pool(hostnames, checker, budget, aggregator),
        Strategy::Admission => admission::run_admission(hostnames, checker, budget, aggregator),
    }
}

/// Like `run_all` with a private aggregator; returns the counts.
pub fn check_all(
    hostnames: &[String],
    checker: &Checker<'_>,
    budget: usize,
    strategy: Strategy,
) -> Summary {
    let aggregator = Aggregator::new(None);
    run_all(hostnames, checker, budget, strategy, &aggregator);
    aggregator.into_summary()
}

/// Runs hostnames batch after batch (each batch under the full budget).
/// `batch_size` None means a single batch. `on_batch(index, len)` is called
/// before each batch starts, with a 0-based index.
pub fn run_batches<F>(
    hostnames: &[String],
    batch_size: Option<usize>,
    checker: &Checker<'_>,
    budget: usize,
    strategy: Strategy,
    aggregator: &Aggregator<'_>,
    mut on_batch: F,
) -> usize
where
    F: FnMut(usize, usize),
{
    let batches = match batch_size {
        Some(size) => partition(hostnames, size),
        None if hostnames.is_empty() => Vec::new(),
        None => vec![hostnames],
    };
    for (index, batch) in batches.iter().enumerate() {
        on_batch(index, batch.len());
        run_all(batch, checker, budget, strategy, aggregator);
    }
    batches.len()
}

/// Resolves one hostname; a panic inside resolution still yields an outcome.
fn resolve_guarded(checker: &Checker<'_>, hostname: &str) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| checker.resolve(hostname))) {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::error!(hostname, "resolution panicked");
            Outcome::failed(hostname, "internal error: resolution panicked")
        }
    }
}
