//! Request pacing.
//!
//! Sources are fetched strictly one after another; these delays are
//! the only thing keeping the scraper under upstream rate limits.
//! Every call site gets its own (min, max) interval and the actual
//! wait goes through a `Sleeper`, so tests can record delays instead
//! of waiting them out.

use std::time::Duration;

use async_trait::async_trait;
use rand::random_range;
use serde::Deserialize;

/// Bounded delay, in milliseconds. `min == max` means fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Interval {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Interval {
    pub const fn between(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn fixed(ms: u64) -> Self {
        Self::between(ms, ms)
    }

    /// Draw a delay inside the interval. Swapped bounds are tolerated.
    pub fn pick(&self) -> Duration {
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };

        let ms = if lo == hi { lo } else { random_range(lo..=hi) };
        Duration::from_millis(ms)
    }
}

/// Delays applied by the coordinator, one per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PacingPolicy {
    /// After each page that has a successor
    pub between_pages: Interval,

    /// After each insert attempt
    pub between_inserts: Interval,

    /// Before moving on to the next source
    pub between_sources: Interval,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            between_pages: Interval::between(5_000, 15_000),
            between_inserts: Interval::fixed(500),
            between_sources: Interval::fixed(15_000),
        }
    }
}

/// Suspension point used for pacing.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
