// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:     Configuration structs loaded from JSON
// - schema:     Raw and normalized posting records
// - normalize:  Dates, slugs, links, experience and salary extraction
// - dedup:      Identity key of a posting
// - error:      Typed transport and storage errors
// - fetch:      HTTP transport
// - pacing:     Delays between pages, inserts and sources
// - sources:    Site adapters and adapter registry
// - store:      Posting persistence (Redis or in-memory)
// - collector:  Ingestion coordinator and scheduler
//
mod collector;
mod config;
mod dedup;
mod error;
mod fetch;
mod metrics;
mod normalize;
mod pacing;
mod schema;
mod sources;
mod store;

// ------------------------------------------------------------
// External dependencies
// ------------------------------------------------------------

use rustls::crypto::{CryptoProvider, ring};

use collector::runner::Coordinator;
use collector::scheduler::{spawn_startup_run, start_scheduler};
use config::Config;
use fetch::HttpFetcher;
use log::{error, info, warn};
use metrics::METRICS;
use sources::build_adapter;
use store::seed::import_if_empty;
use store::{MemoryStore, PostingStore, RedisStore};

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Responsibilities:
// - Initialize cryptography backend (rustls) and logging
// - Load configuration
// - Open the posting store (and seed it when empty)
// - Register enabled sources
// - Run once at startup, then on the cron schedule
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --------------------------------------------------------
    // IMPORTANT:
    // rustls >= 0.23 requires an explicit CryptoProvider
    // installation, once, before the HTTP client is built.
    // --------------------------------------------------------
    CryptoProvider::install_default(ring::default_provider())
        .map_err(|_| anyhow::anyhow!("failed to install rustls CryptoProvider"))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config: Config = load_config("config.json")?;

    // --------------------------------------------------------
    // Posting store
    //
    // A store that cannot be reached is fatal: nothing a run
    // produces could be kept.
    // --------------------------------------------------------
    let store: Arc<dyn PostingStore> = if config.store.demo {
        warn!("DEMO mode: postings are kept in memory only");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(RedisStore::connect(&config.store.url, &config.store.key_prefix).await?)
    };

    if let Some(seed_file) = &config.store.seed_file {
        match import_if_empty(store.as_ref(), Path::new(seed_file)).await {
            Ok(0) => {}
            Ok(imported) => info!("[Seed] Imported {} jobs from {}", imported, seed_file),
            Err(e) => warn!("[Seed] {:#}", e),
        }
    }

    // --------------------------------------------------------
    // Sources, in configured order
    // --------------------------------------------------------
    let mut adapters = Vec::new();

    for source_cfg in config.sources.iter().filter(|s| s.enabled) {
        match build_adapter(source_cfg) {
            Ok(adapter) => {
                info!("Registered source {} ({})", source_cfg.name, source_cfg.adapter);
                adapters.push(adapter);
            }
            Err(e) => error!("Source '{}' is not supported: {:#}", source_cfg.name, e),
        }
    }

    let coordinator = Arc::new(Coordinator::new(
        adapters,
        Arc::new(HttpFetcher::new()?),
        store,
        config.pacing,
        Duration::from_millis(config.http.timeout_ms),
    ));

    // --------------------------------------------------------
    // Start metrics reporter (periodic, low-noise)
    // --------------------------------------------------------
    tokio::spawn(async {
        loop {
            sleep(Duration::from_secs(60)).await;
            info!("[METRICS] {}", METRICS.summary());
        }
    });

    // --------------------------------------------------------
    // Startup run, then the recurring schedule
    //
    // A scheduled tick that lands while the startup run is
    // still going is dropped by the coordinator.
    // --------------------------------------------------------
    spawn_startup_run(coordinator.clone());

    let mut scheduler = start_scheduler(coordinator, &config.schedule).await?;

    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    scheduler.shutdown().await?;

    Ok(())
}

// ------------------------------------------------------------
// Configuration loader
// ------------------------------------------------------------
//
// Reads a JSON configuration file from disk and deserializes
// it into the strongly typed `Config` structure.
//
// `REDIS_URL` in the environment wins over `store.url`, so the
// same file works across deployments.
//
fn load_config(path: &str) -> anyhow::Result<Config> {
    let data = fs::read_to_string(path)?;
    let mut cfg: Config = serde_json::from_str(&data)?;

    if let Ok(url) = std::env::var("REDIS_URL") {
        cfg.store.url = url;
    }

    Ok(cfg)
}
