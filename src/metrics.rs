use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;

/// Global runtime metrics for the harvester.
///
/// Purpose:
/// - Track run lifecycle (started / completed / dropped triggers)
/// - Track page-level transport health
/// - Track what happened to every parsed element
///
/// Design:
/// - Lock-free (Atomics)
/// - Cheap to update
/// - Safe in async + multithreaded contexts
#[derive(Default)]
pub struct RuntimeMetrics {
    // Runs
    pub runs_started: AtomicUsize,
    pub runs_completed: AtomicUsize,
    pub runs_skipped: AtomicUsize,

    // Pages
    pub pages_fetched: AtomicUsize,
    pub page_failures: AtomicUsize,

    // Elements
    pub postings_parsed: AtomicUsize,
    pub elements_skipped: AtomicUsize,
    pub elements_filtered: AtomicUsize,

    // Persistence
    pub postings_inserted: AtomicUsize,
    pub duplicates: AtomicUsize,
    pub insert_errors: AtomicUsize,

    pub source_failures: AtomicUsize,
}

impl RuntimeMetrics {
    /// One-line summary for the periodic reporter.
    pub fn summary(&self) -> String {
        let get = |counter: &AtomicUsize| counter.load(Ordering::Relaxed);

        format!(
            "runs={}/{} skipped_runs={} pages={} page_err={} parsed={} skipped={} filtered={} inserted={} dup={} insert_err={} source_err={}",
            get(&self.runs_completed),
            get(&self.runs_started),
            get(&self.runs_skipped),
            get(&self.pages_fetched),
            get(&self.page_failures),
            get(&self.postings_parsed),
            get(&self.elements_skipped),
            get(&self.elements_filtered),
            get(&self.postings_inserted),
            get(&self.duplicates),
            get(&self.insert_errors),
            get(&self.source_failures),
        )
    }
}

/// Global metrics registry (singleton)
pub static METRICS: Lazy<Arc<RuntimeMetrics>> =
    Lazy::new(|| Arc::new(RuntimeMetrics::default()));

/// Shorthand for the common relaxed increment.
pub fn bump(counter: &AtomicUsize, by: usize) {
    counter.fetch_add(by, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reflects_counters() {
        let metrics = RuntimeMetrics::default();
        bump(&metrics.runs_started, 2);
        bump(&metrics.runs_completed, 1);
        bump(&metrics.postings_inserted, 7);

        let line = metrics.summary();
        assert!(line.starts_with("runs=1/2 "));
        assert!(line.contains("inserted=7"));
    }
}
