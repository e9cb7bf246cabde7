use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::pipeline::MandiScraper;

/// Owns the cron scheduler for the daily scrape. Start it once, shut it down on exit.
pub struct ScrapeScheduler {
    inner: JobScheduler,
}

impl ScrapeScheduler {
    /// `cron` is the six-field form (seconds first), e.g. `0 7 15 * * *`.
    pub async fn start(scraper: Arc<MandiScraper>, cron: &str) -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("failed to create scheduler")?;

        let job = Job::new_async(cron, move |_uuid, _lock| {
            let scraper = scraper.clone();
            Box::pin(async move {
                info!("running scheduled data scraping");
                let outcome = scraper.run().await;
                info!(?outcome, "scheduled scrape finished");
            })
        })
        .with_context(|| format!("invalid scrape schedule {cron:?}"))?;

        inner.add(job).await.context("failed to add scrape job")?;
        inner.start().await.context("failed to start scheduler")?;
        info!(%cron, "scheduler started");

        Ok(Self { inner })
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("failed to stop scheduler")?;
        info!("scheduler stopped");
        Ok(())
    }
}
