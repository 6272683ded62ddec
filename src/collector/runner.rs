use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt;
use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use crate::{
    fetch::Fetcher,
    metrics::{METRICS, bump},
    normalize::normalize_posting,
    pacing::{Interval, PacingPolicy, Sleeper, TokioSleeper},
    schema::NormalizedPosting,
    sources::adapter::SourceAdapter,
    store::{InsertOutcome, PostingStore},
};

/// What started a run. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Scheduled,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Startup => f.write_str("startup"),
            Trigger::Scheduled => f.write_str("scheduled"),
        }
    }
}

/// Coordinator state. Indices refer to the configured source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,

    /// Fetching and parsing pages of source `i`
    RunningSource(usize),

    /// Persisting what source `i` produced
    Draining(usize),
}

/// Counters for one source within one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub pages_fetched: usize,
    pub page_failures: usize,
    pub parsed: usize,
    pub skipped: usize,
    pub filtered: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub insert_failures: usize,
}

/// Outcome of one full run. `inserted` is the headline number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub filtered: usize,
    pub page_failures: usize,
    pub insert_failures: usize,
    pub failed_sources: usize,
}

impl RunReport {
    fn absorb(&mut self, source: &SourceReport) {
        self.inserted += source.inserted;
        self.duplicates += source.duplicates;
        self.skipped += source.skipped;
        self.filtered += source.filtered;
        self.page_failures += source.page_failures;
        self.insert_failures += source.insert_failures;
    }
}

/// Ingestion coordinator.
///
/// Runs every configured source, strictly one after another:
///
///     fetch pages -> parse -> normalize -> dedup -> persist
///
/// GUARANTEES:
/// - At most one run at a time; a trigger arriving during a run is
///   dropped (the next scheduled tick starts a fresh one)
/// - A failing page, record or whole source never stops the rest
///   of the run
/// - A run never returns an error
///
/// NOT RESPONSIBLE FOR:
/// - When runs happen (scheduler)
/// - Site markup (adapters)
///
pub struct Coordinator {
    sources: Vec<Arc<dyn SourceAdapter>>,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn PostingStore>,
    sleeper: Arc<dyn Sleeper>,
    pacing: PacingPolicy,
    fetch_timeout: Duration,
    run_lock: Mutex<()>,
    state: StdMutex<RunState>,
}

impl Coordinator {
    pub fn new(
        sources: Vec<Arc<dyn SourceAdapter>>,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn PostingStore>,
        pacing: PacingPolicy,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            sources,
            fetcher,
            store,
            sleeper: Arc::new(TokioSleeper),
            pacing,
            fetch_timeout,
            run_lock: Mutex::new(()),
            state: StdMutex::new(RunState::Idle),
        }
    }

    /// Replace the pacing sleeper (tests record instead of waiting).
    #[cfg(test)]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Start a run unless one is already active.
    ///
    /// Returns `None` when the trigger was dropped.
    pub async fn trigger(&self, trigger: Trigger) -> Option<RunReport> {
        let Ok(_running) = self.run_lock.try_lock() else {
            warn!(
                "[Scraper] {trigger} trigger dropped: a run is already in progress ({:?})",
                self.state()
            );
            bump(&METRICS.runs_skipped, 1);
            return None;
        };

        info!("[Scraper] {trigger} run started ({} sources)", self.sources.len());
        let report = self.run().await;

        info!(
            "[Scraper] {trigger} run completed: {} jobs added ({} duplicates, {} skipped, {} filtered, {} page failures, {} insert failures, {} failed sources)",
            report.inserted,
            report.duplicates,
            report.skipped,
            report.filtered,
            report.page_failures,
            report.insert_failures,
            report.failed_sources
        );

        Some(report)
    }

    async fn run(&self) -> RunReport {
        bump(&METRICS.runs_started, 1);
        let mut report = RunReport::default();

        for (index, adapter) in self.sources.iter().enumerate() {
            if index > 0 {
                self.pause(self.pacing.between_sources).await;
            }

            self.set_state(RunState::RunningSource(index));
            info!("[Scraper] Scraping {} ({})...", adapter.name(), adapter.fetch_strategy());

            // Partial counts survive a panic; they describe what was
            // already committed.
            let mut source = SourceReport::default();
            let outcome = AssertUnwindSafe(self.run_source(index, adapter.as_ref(), &mut source))
                .catch_unwind()
                .await;

            if outcome.is_err() {
                error!("[Scraper] Error in {}: source processing panicked", adapter.name());
                report.failed_sources += 1;
                bump(&METRICS.source_failures, 1);
            } else {
                info!(
                    "[Scraper] {}: {} new, {} duplicates, {} skipped, {} filtered",
                    adapter.name(),
                    source.inserted,
                    source.duplicates,
                    source.skipped,
                    source.filtered
                );
            }

            record_metrics(&source);
            report.absorb(&source);
        }

        self.set_state(RunState::Idle);
        bump(&METRICS.runs_completed, 1);

        report
    }

    async fn run_source(&self, index: usize, adapter: &dyn SourceAdapter, report: &mut SourceReport) {
        let pages = adapter.page_count();
        let mut raw = Vec::new();

        for page in 0..pages {
            let url = adapter.page_url(page);
            debug!("[{}] Scraping page {}: {}", adapter.name(), page, url);

            match self
                .fetcher
                .fetch(&url, &adapter.headers(), self.fetch_timeout)
                .await
            {
                Ok(body) => {
                    report.pages_fetched += 1;

                    match panic::catch_unwind(AssertUnwindSafe(|| adapter.parse(&body))) {
                        Ok(outcome) => {
                            report.parsed += outcome.postings.len();
                            report.skipped += outcome.skipped;
                            report.filtered += outcome.filtered;
                            raw.extend(outcome.postings);
                        }
                        Err(_) => {
                            warn!("[{}] parser failed on page {}", adapter.name(), page);
                            report.page_failures += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!("[{}] Error fetching page {}: {}", adapter.name(), page, e);
                    report.page_failures += 1;
                }
            }

            if page + 1 < pages {
                self.pause(self.pacing.between_pages).await;
            }
        }

        info!("[Scraper] Found {} valid jobs from {}", raw.len(), adapter.name());

        self.set_state(RunState::Draining(index));

        let now = Utc::now();
        let policy = adapter.link_policy();

        for posting in &raw {
            let normalized = normalize_posting(posting, adapter.name(), &policy, now);
            self.persist(&normalized, report).await;
        }
    }

    /// Store one posting unless its key is already taken.
    async fn persist(&self, posting: &NormalizedPosting, report: &mut SourceReport) {
        match self.store.exists(&posting.dedup_key).await {
            Ok(true) => {
                report.duplicates += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                warn!("[Scraper] DB error for {}: {}", posting.dedup_key, e);
                report.insert_failures += 1;
                return;
            }
        }

        match self.store.insert(posting).await {
            Ok(InsertOutcome::Inserted) => report.inserted += 1,

            // Lost a race with a concurrent writer
            Ok(InsertOutcome::Duplicate) => report.duplicates += 1,

            Err(e) => {
                warn!("[Scraper] DB error for {}: {}", posting.dedup_key, e);
                report.insert_failures += 1;
            }
        }

        self.pause(self.pacing.between_inserts).await;
    }

    async fn pause(&self, interval: Interval) {
        self.sleeper.sleep(interval.pick()).await;
    }
}

fn record_metrics(source: &SourceReport) {
    bump(&METRICS.pages_fetched, source.pages_fetched);
    bump(&METRICS.page_failures, source.page_failures);
    bump(&METRICS.postings_parsed, source.parsed);
    bump(&METRICS.elements_skipped, source.skipped);
    bump(&METRICS.elements_filtered, source.filtered);
    bump(&METRICS.postings_inserted, source.inserted);
    bump(&METRICS.duplicates, source.duplicates);
    bump(&METRICS.insert_errors, source.insert_failures);
}
