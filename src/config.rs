use std::collections::BTreeMap;

use serde::Deserialize;

use crate::pacing::PacingPolicy;

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// Top-level structure loaded from `config.json`.
//
// It defines:
// - Where postings are stored
// - When runs are triggered
// - How aggressively sources are paced
// - Which sources are scraped, in order
//
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub pacing: PacingPolicy,

    #[serde(default)]
    pub http: HttpConfig,

    /// Scraped in declared order
    pub sources: Vec<SourceConfig>,
}

// ------------------------------------------------------------
// Store configuration
// ------------------------------------------------------------
//
// Notes:
// - `REDIS_URL` in the environment overrides `url`.
// - `demo` keeps everything in memory (nothing survives restart).
//
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Namespace for every key written by this process
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    #[serde(default)]
    pub demo: bool,

    /// JSON array of postings imported when the store is empty
    pub seed_file: Option<String>,
}

// ------------------------------------------------------------
// Schedule configuration
// ------------------------------------------------------------
//
// `cron` accepts the classic five-field form ("0 2 * * *") or the
// six-field form with a leading seconds column. Times are UTC.
//
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default = "default_cron")]
    pub cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: default_cron(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

// ------------------------------------------------------------
// Source configuration
// ------------------------------------------------------------
//
// One entry per scraped listing. Several entries may share an
// adapter (e.g. two LinkedIn searches with different keywords).
//
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Display name, stored on every posting as its source
    pub name: String,

    /// Adapter kind: "linkedin" | "naukri"
    pub adapter: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Listing URL for single-page sources; adapters have a default
    pub url: Option<String>,

    /// Number of result pages for paginated sources
    #[serde(default = "default_pages")]
    pub pages: usize,

    /// Search keywords for paginated search APIs
    #[serde(default)]
    pub keywords: String,

    #[serde(default)]
    pub location: String,

    /// Keep only fresher / entry-level titles
    #[serde(default)]
    pub fresher_only: bool,

    /// Sent with every request to this source
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Replace the configured User-Agent with a random browser one
    /// per request
    #[serde(default)]
    pub rotate_user_agent: bool,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "jobs".to_string()
}

fn default_cron() -> String {
    "0 2 * * *".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_pages() -> usize {
    1
}

fn default_true() -> bool {
    true
}
