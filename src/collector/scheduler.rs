use std::sync::Arc;

use anyhow::Context;
use log::info;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::ScheduleConfig;

use super::runner::{Coordinator, RunReport, Trigger};

/// Normalize a cron expression to the seconds-first form the
/// scheduler expects.
///
/// Classic 5-field expressions ("0 2 * * *") get a leading "0"
/// seconds field; anything else is passed through trimmed.
pub fn cron_expression(raw: &str) -> String {
    let raw = raw.trim();

    if raw.split_whitespace().count() == 5 {
        format!("0 {raw}")
    } else {
        raw.to_string()
    }
}

/// Run the coordinator once, right away, in the background.
pub fn spawn_startup_run(coordinator: Arc<Coordinator>) -> JoinHandle<Option<RunReport>> {
    tokio::spawn(async move { coordinator.trigger(Trigger::Startup).await })
}

/// Register the recurring run and start the scheduler.
///
/// IMPORTANT:
/// - Each tick only *requests* a run; the coordinator drops it
///   when the previous run is still going
/// - A bad run never unregisters the job
///
/// The returned scheduler must be kept alive by the caller.
pub async fn start_scheduler(
    coordinator: Arc<Coordinator>,
    cfg: &ScheduleConfig,
) -> anyhow::Result<JobScheduler> {
    let expression = cron_expression(&cfg.cron);

    let job = Job::new_async(expression.as_str(), move |_uuid, _lock| {
        let coordinator = coordinator.clone();
        Box::pin(async move {
            info!("[Scheduler] Starting scheduled scrape...");

            if let Some(report) = coordinator.trigger(Trigger::Scheduled).await {
                info!("[Scheduler] Scheduled scrape finished, {} jobs added", report.inserted);
            }
        })
    })
    .with_context(|| format!("invalid cron expression '{}'", cfg.cron))?;

    let scheduler = JobScheduler::new()
        .await
        .context("failed to create scheduler")?;

    scheduler.add(job).await.context("failed to register job")?;
    scheduler.start().await.context("failed to start scheduler")?;

    info!("[Scheduler] Scraper scheduled ({})", expression);

    Ok(scheduler)
}
