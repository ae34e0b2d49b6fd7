//! Per-hostname outcomes and their aggregation into a run summary.
//!
//! `Aggregator::record` is called concurrently by every worker: counts are
//! updated under a mutex and outcomes are handed to the result writer over a
//! bounded channel.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

/// Final verdict for one hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Classification {
    Match,
    NoMatch,
    Failed,
}

impl Classification {
    /// Name written to the result file and the summary.
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Match => "MATCH",
            Classification::NoMatch => "NOT_MATCH",
            Classification::Failed => "EXCEPTION",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one hostname's classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub hostname: String,
    pub classification: Classification,
    /// Failure message; only set by the resolver for `Failed`.
    pub diagnostic: Option<String>,
}

impl Outcome {
    pub fn new(
        hostname: impl Into<String>,
        classification: Classification,
        diagnostic: Option<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            classification,
            diagnostic,
        }
    }

    pub fn matched(hostname: impl Into<String>) -> Self {
        Self::new(hostname, Classification::Match, None)
    }

    pub fn not_matched(hostname: impl Into<String>) -> Self {
        Self::new(hostname, Classification::NoMatch, None)
    }

    pub fn failed(hostname: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self::new(hostname, Classification::Failed, Some(diagnostic.into()))
    }
}

/// Count of outcomes per classification. Only classifications seen are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    counts: BTreeMap<Classification, usize>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, classification: Classification) {
        *self.counts.entry(classification).or_insert(0) += 1;
    }

    /// Count for one classification (0 if never recorded).
    pub fn get(&self, classification: Classification) -> usize {
        self.counts.get(&classification).copied().unwrap_or(0)
    }

    /// Number of distinct classifications recorded.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts; equals the number of hostnames processed.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Classification, usize)> + '_ {
        self.counts.iter().map(|(c, n)| (*c, *n))
    }
}

/// Collects outcomes from concurrent workers.
///
/// Counts are kept under a mutex; when a sink is attached each outcome is also
/// forwarded to the single result-writer task. Workers are plain threads, so the
/// forward uses `blocking_send` (never call `record` from inside an async task).
pub struct Aggregator<'a> {
    summary: Mutex<Summary>,
    sink: Option<&'a tokio::sync::mpsc::Sender<Outcome>>,
}

impl<'a> Aggregator<'a> {
    pub fn new(sink: Option<&'a tokio::sync::mpsc::Sender<Outcome>>) -> Self {
        Self {
            summary: Mutex::new(Summary::new()),
            sink,
        }
    }

    pub fn record(&self, outcome: Outcome) {
        {
            let mut summary = self.summary.lock().unwrap_or_else(|e| e.into_inner());
            summary.add(outcome.classification);
        }
        if let Some(tx) = self.sink {
            let hostname = outcome.hostname.clone();
            if tx.blocking_send(outcome).is_err() {
                tracing::warn!(%hostname, "result writer closed; outcome not persisted");
            }
        }
    }

    pub fn into_summary(self) -> Summary {
        self.summary.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}
