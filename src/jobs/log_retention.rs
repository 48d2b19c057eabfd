//! Periodic purge of old log entries.

use crate::error::AppResult;
use crate::services::{CleanupOutcome, LogService};

#[derive(Clone)]
pub struct LogRetentionJob {
    logs: LogService,
    retention_days: u32,
}

impl LogRetentionJob {
    pub fn new(logs: LogService, retention_days: u32) -> Self {
        Self {
            logs,
            retention_days,
        }
    }

    /// Deletes entries whose timestamp is older than the retention window.
    pub async fn run(&self) -> AppResult<CleanupOutcome> {
        let outcome = self.logs.purge_older_than(self.retention_days).await?;
        tracing::info!(
            deleted_count = outcome.deleted_count,
            retention_days = self.retention_days,
            before_date = %outcome.before_date,
            "Log retention completed"
        );
        Ok(outcome)
    }
}
