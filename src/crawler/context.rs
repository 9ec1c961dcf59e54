//! Per-run state
//!
//! Everything a single invocation accumulates lives in one explicit
//! `RunContext`: the deadline, the seen-set, the flush buffer, and the
//! counters that become the run summary. Nothing here outlives the run;
//! cross-run state is only ever the dataset and the page checkpoint.

use crate::store::Record;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The wall-clock budget (minus the safety margin) is spent
    DeadlineReached,
    /// The page cursor moved past the last listing page
    CatalogExhausted,
    /// The per-run cap on newly collected URLs was hit
    UrlBudgetSpent,
    /// A listing page kept failing; collection halted so the next run retries it
    ListingStalled,
    /// An operator asked the run to stop
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::DeadlineReached => "deadline reached",
            StopReason::CatalogExhausted => "catalog exhausted",
            StopReason::UrlBudgetSpent => "URL budget spent",
            StopReason::ListingStalled => "listing stalled",
            StopReason::Interrupted => "interrupted",
        };
        f.write_str(text)
    }
}

/// Cooperative wall-clock cutoff
///
/// Checked at phase boundaries only; a page that has started is always
/// finished. Built on the tokio clock so tests can drive it.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    cutoff: Instant,
}

impl Deadline {
    /// A deadline this far in the future
    pub fn after(budget: Duration) -> Self {
        Self {
            cutoff: Instant::now() + budget,
        }
    }

    /// True once the cutoff has passed
    pub fn expired(&self) -> bool {
        Instant::now() >= self.cutoff
    }
}

/// State accumulated by one harvest run
pub struct RunContext {
    deadline: Deadline,
    shutdown: Arc<AtomicBool>,
    started: Instant,
    /// Dataset keys plus URLs discovered this run
    seen: HashSet<String>,
    /// Extracted records awaiting a flush
    pub(crate) buffer: Vec<Record>,
    /// Set when a listing page exhausts its attempts
    pub(crate) collection_stalled: bool,
    pub(crate) pages_visited: u32,
    pub(crate) urls_collected: usize,
    pub(crate) details_fetched: usize,
    pub(crate) complete: usize,
    pub(crate) partial: usize,
    pub(crate) failed: usize,
    pub(crate) records_flushed: usize,
    pub(crate) records_inserted: usize,
}

impl RunContext {
    /// Starts the clock and folds the dataset's keys into the seen-set
    pub fn new(budget: Duration, existing: HashSet<String>, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            deadline: Deadline::after(budget),
            shutdown,
            started: Instant::now(),
            seen: existing,
            buffer: Vec::new(),
            collection_stalled: false,
            pages_visited: 0,
            urls_collected: 0,
            details_fetched: 0,
            complete: 0,
            partial: 0,
            failed: 0,
            records_flushed: 0,
            records_inserted: 0,
        }
    }

    /// Registers a discovered URL
    ///
    /// Returns true when the URL is new to both the dataset and this run,
    /// meaning its detail page is worth fetching.
    pub fn mark_new(&mut self, url: &str) -> bool {
        if self.seen.contains(url) {
            return false;
        }
        self.seen.insert(url.to_string());
        self.urls_collected += 1;
        true
    }

    /// True when an operator has asked the run to stop
    pub fn interrupted(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// True once the budgeted time is spent
    pub fn deadline_expired(&self) -> bool {
        self.deadline.expired()
    }

    /// True when the run should wind down at the next phase boundary
    pub fn should_stop(&self) -> bool {
        self.interrupted() || self.deadline_expired()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Seals the run into its summary
    pub fn finish(self, stop: StopReason) -> RunSummary {
        RunSummary {
            stop,
            pages_visited: self.pages_visited,
            urls_collected: self.urls_collected,
            details_fetched: self.details_fetched,
            complete: self.complete,
            partial: self.partial,
            failed: self.failed,
            records_flushed: self.records_flushed,
            records_inserted: self.records_inserted,
            elapsed: self.started.elapsed(),
        }
    }
}

/// What one run accomplished
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stop: StopReason,
    /// Listing pages fully enumerated
    pub pages_visited: u32,
    /// URLs newly collected this run
    pub urls_collected: usize,
    /// Detail pages fetched (or given up on) this run
    pub details_fetched: usize,
    pub complete: usize,
    pub partial: usize,
    pub failed: usize,
    /// Records handed to the dataset, including duplicates it skipped
    pub records_flushed: usize,
    /// Rows the dataset actually gained
    pub records_inserted: usize,
    pub elapsed: Duration,
}
