use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioCronScheduler};

use crate::config::JobsConfig;
use crate::error::{AppError, AppResult};
use crate::jobs::log_retention::LogRetentionJob;
use crate::services::LogService;

/// Wrapper around tokio-cron-scheduler holding the configured jobs.
pub struct JobScheduler {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
    scheduled: usize,
}

impl JobScheduler {
    pub async fn new() -> AppResult<Self> {
        let scheduler = TokioCronScheduler::new().await.map_err(scheduler_error)?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            scheduled: 0,
        })
    }

    /// Registers every job enabled in `config`.
    pub async fn register(&mut self, config: &JobsConfig, logs: &LogService) -> AppResult<()> {
        let retention = &config.log_retention;
        if retention.enabled {
            let job = LogRetentionJob::new(logs.clone(), retention.retention_days);
            self.schedule(&retention.cron, job).await?;
            tracing::info!(
                cron = %retention.cron,
                retention_days = retention.retention_days,
                "Log retention job scheduled"
            );
        }
        Ok(())
    }

    /// Number of jobs registered so far.
    pub fn scheduled(&self) -> usize {
        self.scheduled
    }

    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(scheduler_error)
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&self) -> AppResult<()> {
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(scheduler_error)
    }

    async fn schedule(&mut self, cron: &str, job: LogRetentionJob) -> AppResult<()> {
        let job = Arc::new(job);
        let cron_job = Job::new_async(cron, move |_uuid, _lock| {
            let job = Arc::clone(&job);
            Box::pin(async move {
                if let Err(e) = job.run().await {
                    tracing::error!(error = %e, "Log retention job failed");
                }
            })
        })
        .map_err(|e| {
            AppError::validation(
                "jobs.log_retention.cron",
                format!("Invalid cron expression: {}", e),
            )
        })?;

        self.scheduler
            .lock()
            .await
            .add(cron_job)
            .await
            .map_err(scheduler_error)?;
        self.scheduled += 1;
        Ok(())
    }
}

fn scheduler_error(error: tokio_cron_scheduler::JobSchedulerError) -> AppError {
    AppError::Internal {
        source: anyhow::Error::from(error),
    }
}
