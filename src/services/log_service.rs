//! Central log store: ingestion, queries, reports and age-based purge.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{LogEntry, LogFilter, LogLevel, NewLogEntry, ServiceName, Window};
use crate::repositories::LogEntryRepository;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 500;
pub const LIST_LIMIT: i64 = 1000;
pub const SCOPED_LIMIT: i64 = 500;

const SUMMARY_DAYS: i64 = 7;
const STATS_DAYS: i64 = 30;
/// Cleanup never touches the most recent day of logs.
const MIN_CLEANUP_AGE_DAYS: i64 = 1;

/// A log entry as submitted; `service` and `level` are parsed here.
#[derive(Debug, Clone, Default)]
pub struct LogDraft {
    pub service: String,
    pub level: String,
    pub message: String,
    pub request_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub exception: Option<String>,
    pub additional_data: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogSummary {
    pub total_logs: i64,
    pub error_count: i64,
    pub warning_count: i64,
    pub info_count: i64,
    pub service_counts: BTreeMap<String, i64>,
    pub level_counts: BTreeMap<String, i64>,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
}

/// Entry count for one (day, service, level) bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct LogStat {
    pub date: NaiveDate,
    pub service: ServiceName,
    pub level: LogLevel,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanupOutcome {
    pub deleted_count: usize,
    pub before_date: DateTime<Utc>,
}

#[derive(Clone)]
pub struct LogService {
    repo: Arc<dyn LogEntryRepository>,
}

impl LogService {
    pub fn new(repo: Arc<dyn LogEntryRepository>) -> Self {
        Self { repo }
    }

    /// Newest 1000 entries.
    pub async fn list(&self) -> AppResult<Vec<LogEntry>> {
        self.repo
            .search(&LogFilter::default(), Window::first(LIST_LIMIT))
            .await
    }

    /// Non-admin callers are limited to entries carrying their own username.
    pub async fn search(
        &self,
        caller: &AuthUser,
        mut filter: LogFilter,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> AppResult<Vec<LogEntry>> {
        if !caller.is_admin() {
            filter.username = Some(caller.username.clone());
        }
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        self.repo
            .search(&filter, Window::page(page.unwrap_or(1), page_size))
            .await
    }

    pub async fn get(&self, entry_id: i32) -> AppResult<LogEntry> {
        self.repo
            .find_by_id(entry_id)
            .await?
            .ok_or_else(|| AppError::not_found("log_entry", "id", entry_id))
    }

    pub async fn by_service(&self, service: &str) -> AppResult<Vec<LogEntry>> {
        let filter = LogFilter {
            service: Some(parse_service(service)?),
            ..Default::default()
        };
        self.repo.search(&filter, Window::first(SCOPED_LIMIT)).await
    }

    pub async fn by_level(&self, level: &str) -> AppResult<Vec<LogEntry>> {
        let filter = LogFilter {
            level: Some(parse_level(level)?),
            ..Default::default()
        };
        self.repo.search(&filter, Window::first(SCOPED_LIMIT)).await
    }

    pub async fn my_logs(&self, caller: &AuthUser) -> AppResult<Vec<LogEntry>> {
        let filter = LogFilter {
            username: Some(caller.username.clone()),
            ..Default::default()
        };
        self.repo.search(&filter, Window::first(SCOPED_LIMIT)).await
    }

    /// Stores an entry attributed to `caller`. The level is stored upper-case.
    pub async fn create(&self, caller: &AuthUser, draft: LogDraft) -> AppResult<LogEntry> {
        let service = parse_service(&draft.service)?;
        let level = parse_level(&draft.level)?;
        let now = Utc::now();

        let entry = self
            .repo
            .create(NewLogEntry {
                service,
                level,
                message: draft.message,
                username: Some(caller.username.clone()),
                request_id: draft.request_id,
                ip_address: draft.ip_address,
                user_agent: draft.user_agent,
                exception: draft.exception,
                additional_data: draft.additional_data,
                timestamp: draft.timestamp.unwrap_or(now),
                created_at: now,
            })
            .await?;

        tracing::debug!(entry_id = entry.id, %service, %level, "Log entry stored");
        Ok(entry)
    }

    /// Totals over `[from, to]`, defaulting to the last 7 days.
    pub async fn summary(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> AppResult<LogSummary> {
        let to_date = to.unwrap_or_else(Utc::now);
        let from_date = from.unwrap_or(to_date - Duration::days(SUMMARY_DAYS));
        let activity = self.repo.activity(from_date, to_date).await?;

        let mut summary = LogSummary {
            total_logs: activity.len() as i64,
            error_count: 0,
            warning_count: 0,
            info_count: 0,
            service_counts: BTreeMap::new(),
            level_counts: BTreeMap::new(),
            from_date,
            to_date,
        };
        for row in &activity {
            match row.level {
                LogLevel::Error => summary.error_count += 1,
                LogLevel::Warning => summary.warning_count += 1,
                LogLevel::Info => summary.info_count += 1,
                _ => {}
            }
            *summary
                .service_counts
                .entry(row.service.to_string())
                .or_insert(0) += 1;
            *summary.level_counts.entry(row.level.to_string()).or_insert(0) += 1;
        }

        Ok(summary)
    }

    /// Per-day counts over `[from, to]`, defaulting to the last 30 days.
    /// Ordered by date, then service name, then level name.
    pub async fn stats(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<LogStat>> {
        let to_date = to.unwrap_or_else(Utc::now);
        let from_date = from.unwrap_or(to_date - Duration::days(STATS_DAYS));

        let mut buckets: BTreeMap<(NaiveDate, &'static str, &'static str), LogStat> =
            BTreeMap::new();
        for row in self.repo.activity(from_date, to_date).await? {
            let date = row.timestamp.date_naive();
            buckets
                .entry((date, row.service.as_str(), row.level.as_str()))
                .or_insert(LogStat {
                    date,
                    service: row.service,
                    level: row.level,
                    count: 0,
                })
                .count += 1;
        }

        Ok(buckets.into_values().collect())
    }

    pub async fn count(&self, service: Option<&str>, level: Option<&str>) -> AppResult<i64> {
        let filter = LogFilter {
            service: service.map(parse_service).transpose()?,
            level: level.map(parse_level).transpose()?,
            ..Default::default()
        };
        self.repo.count(&filter).await
    }

    /// Deletes entries older than `before_date`, which must be at least a day in the past.
    pub async fn cleanup(&self, before_date: DateTime<Utc>) -> AppResult<CleanupOutcome> {
        let latest_allowed = Utc::now() - Duration::days(MIN_CLEANUP_AGE_DAYS);
        if before_date > latest_allowed {
            return Err(AppError::validation(
                "before_date",
                "Cannot delete logs from the last 24 hours",
            ));
        }

        let deleted_count = self.repo.purge_before(before_date).await?;
        tracing::info!(deleted_count, %before_date, "Old log entries deleted");
        Ok(CleanupOutcome {
            deleted_count,
            before_date,
        })
    }

    /// Retention sweep: removes entries older than `retention_days`.
    pub async fn purge_older_than(&self, retention_days: u32) -> AppResult<CleanupOutcome> {
        let days = i64::from(retention_days.max(MIN_CLEANUP_AGE_DAYS as u32));
        self.cleanup(Utc::now() - Duration::days(days)).await
    }
}

fn parse_service(value: &str) -> AppResult<ServiceName> {
    value
        .parse::<ServiceName>()
        .map_err(|reason| AppError::validation("service", reason))
}

fn parse_level(value: &str) -> AppResult<LogLevel> {
    value
        .parse::<LogLevel>()
        .map_err(|reason| AppError::validation("level", reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::repositories::memory::MemoryLogEntryRepository;
    use chrono::TimeZone;

    fn service() -> LogService {
        LogService::new(Arc::new(MemoryLogEntryRepository::default()))
    }

    fn caller(username: &str, role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            role,
        }
    }

    fn draft(service: &str, level: &str, message: &str) -> LogDraft {
        LogDraft {
            service: service.to_string(),
            level: level.to_string(),
            message: message.to_string(),
            ..Default::default()
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_create_normalises_level_and_stamps_user() {
        let logs = service();
        let entry = logs
            .create(&caller("alice", Role::User), draft("ProductsService", "warning", "low stock"))
            .await
            .unwrap();
        assert_eq!(entry.level, LogLevel::Warning);
        assert_eq!(entry.level.as_str(), "WARNING");
        assert_eq!(entry.username.as_deref(), Some("alice"));
        assert_eq!(entry.service, ServiceName::ProductsService);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_names() {
        let logs = service();
        let user = caller("alice", Role::User);

        let err = logs
            .create(&user, draft("OrdersService", "INFO", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "service"));

        let err = logs
            .create(&user, draft("UsersService", "verbose", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "level"));
    }

    #[tokio::test]
    async fn test_search_scoped_for_non_admins() {
        let logs = service();
        let alice = caller("alice", Role::User);
        let bob = caller("bob", Role::User);
        logs.create(&alice, draft("UsersService", "INFO", "alice in")).await.unwrap();
        logs.create(&bob, draft("UsersService", "INFO", "bob in")).await.unwrap();

        let filter = LogFilter {
            username: Some("bob".to_string()),
            ..Default::default()
        };
        let seen = logs.search(&alice, filter.clone(), None, None).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].message, "alice in");

        let admin = caller("root", Role::Admin);
        let seen = logs.search(&admin, filter, None, None).await.unwrap();
        assert_eq!(seen[0].message, "bob in");

        assert_eq!(logs.my_logs(&bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_and_stats() {
        let logs = service();
        let user = caller("alice", Role::User);
        for (service, level, when) in [
            ("UsersService", "INFO", at(1, 9)),
            ("UsersService", "ERROR", at(1, 10)),
            ("PaymentsService", "ERROR", at(1, 11)),
            ("PaymentsService", "CRITICAL", at(2, 8)),
            ("LogsService", "WARNING", at(2, 9)),
            ("LogsService", "INFO", at(20, 9)),
        ] {
            let mut entry = draft(service, level, "event");
            entry.timestamp = Some(when);
            logs.create(&user, entry).await.unwrap();
        }

        let summary = logs.summary(Some(at(1, 0)), Some(at(3, 0))).await.unwrap();
        assert_eq!(summary.total_logs, 5);
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.warning_count, 1);
        assert_eq!(summary.info_count, 1);
        assert_eq!(summary.service_counts["PaymentsService"], 2);
        assert_eq!(summary.level_counts["CRITICAL"], 1);
        assert!(!summary.service_counts.contains_key("ProductsService"));

        let stats = logs.stats(Some(at(1, 0)), Some(at(3, 0))).await.unwrap();
        let rows: Vec<(u32, &str, &str, i64)> = stats
            .iter()
            .map(|s| {
                use chrono::Datelike;
                (s.date.day(), s.service.as_str(), s.level.as_str(), s.count)
            })
            .collect();
        assert_eq!(
            rows,
            [
                (1, "PaymentsService", "ERROR", 1),
                (1, "UsersService", "ERROR", 1),
                (1, "UsersService", "INFO", 1),
                (2, "LogsService", "WARNING", 1),
                (2, "PaymentsService", "CRITICAL", 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_count_with_filters() {
        let logs = service();
        let user = caller("alice", Role::User);
        logs.create(&user, draft("UsersService", "INFO", "a")).await.unwrap();
        logs.create(&user, draft("UsersService", "ERROR", "b")).await.unwrap();
        logs.create(&user, draft("LogsService", "ERROR", "c")).await.unwrap();

        assert_eq!(logs.count(None, None).await.unwrap(), 3);
        assert_eq!(logs.count(Some("UsersService"), None).await.unwrap(), 2);
        assert_eq!(logs.count(Some("UsersService"), Some("error")).await.unwrap(), 1);
        assert!(logs.count(Some("Nope"), None).await.is_err());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_last_day() {
        let logs = service();
        let user = caller("alice", Role::User);
        let mut old = draft("UsersService", "INFO", "old");
        old.timestamp = Some(Utc::now() - Duration::days(40));
        logs.create(&user, old).await.unwrap();
        logs.create(&user, draft("UsersService", "INFO", "fresh")).await.unwrap();

        assert!(matches!(
            logs.cleanup(Utc::now() - Duration::hours(2)).await,
            Err(AppError::Validation { .. })
        ));

        let outcome = logs.purge_older_than(30).await.unwrap();
        assert_eq!(outcome.deleted_count, 1);
        let remaining = logs.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].message, "fresh");
    }

    #[tokio::test]
    async fn test_get_unknown_entry() {
        assert!(matches!(service().get(12).await, Err(AppError::NotFound { .. })));
    }
}
