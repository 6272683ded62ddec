/// Collector module
///
/// Orchestration layer of the harvester:
/// - `runner`: the ingestion coordinator (one run = every source,
///   sequentially, fetch -> parse -> normalize -> dedup -> persist)
/// - `scheduler`: startup run and the recurring cron trigger
///
/// Design notes:
/// - Site-specific logic MUST NOT live here (see `sources`)
/// - Storage details MUST NOT live here (see `store`)
pub mod runner;
pub mod scheduler;
