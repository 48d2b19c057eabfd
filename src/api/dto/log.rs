//! Log service DTOs.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{LogEntry, LogFilter, LogLevel, ServiceName};
use crate::services::{CleanupOutcome, LogDraft, LogStat, LogSummary};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateLogRequest {
    /// One of the service names listed by `GET /api/logs/services`
    #[validate(length(min = 1, max = 50, message = "Service must be between 1 and 50 characters"))]
    #[schema(example = "ProductsService")]
    pub service: String,
    /// Case-insensitive; stored upper-case
    #[validate(length(min = 1, max = 20, message = "Level must be between 1 and 20 characters"))]
    #[schema(example = "WARNING")]
    pub level: String,
    #[validate(length(min = 1, max = 1000, message = "Message must be between 1 and 1000 characters"))]
    pub message: String,
    #[validate(length(max = 100, message = "Request ID cannot exceed 100 characters"))]
    pub request_id: Option<String>,
    #[validate(length(max = 45, message = "IP address cannot exceed 45 characters"))]
    pub ip_address: Option<String>,
    #[validate(length(max = 500, message = "User agent cannot exceed 500 characters"))]
    pub user_agent: Option<String>,
    #[validate(length(max = 2000, message = "Exception cannot exceed 2000 characters"))]
    pub exception: Option<String>,
    #[validate(length(max = 500, message = "Additional data cannot exceed 500 characters"))]
    pub additional_data: Option<String>,
    /// Defaults to the time of receipt
    pub timestamp: Option<DateTime<Utc>>,
}

impl CreateLogRequest {
    pub fn into_draft(self) -> LogDraft {
        LogDraft {
            service: self.service,
            level: self.level,
            message: self.message,
            request_id: self.request_id,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            exception: self.exception,
            additional_data: self.additional_data,
            timestamp: self.timestamp,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct LogSearchQuery {
    pub service: Option<String>,
    pub level: Option<String>,
    /// Ignored for non-admin callers
    pub username: Option<String>,
    /// Substring of the message
    pub search_text: Option<String>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: Option<u32>,
    /// Defaults to 50, capped at 500
    #[validate(range(min = 1, message = "Page size must be at least 1"))]
    #[param(minimum = 1, maximum = 500, example = 50)]
    pub page_size: Option<u32>,
}

impl LogSearchQuery {
    pub fn into_filter(self) -> AppResult<(LogFilter, Option<u32>, Option<u32>)> {
        let filter = LogFilter {
            service: parse_optional(self.service, "service")?,
            level: parse_optional(self.level, "level")?,
            username: self.username,
            search_text: self.search_text.filter(|s| !s.is_empty()),
            from_date: self.from_date,
            to_date: self.to_date,
            request_id: self.request_id,
        };
        Ok((filter, self.page, self.page_size))
    }
}

fn parse_optional<T>(value: Option<String>, field: &str) -> AppResult<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<T>().map_err(|reason| AppError::validation(field, reason)))
        .transpose()
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogCountQuery {
    pub service: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CleanupQuery {
    /// Entries older than this are deleted; must be at least a day ago
    pub before_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogEntryResponse {
    pub id: i32,
    pub service: ServiceName,
    pub level: LogLevel,
    pub message: String,
    pub username: Option<String>,
    pub request_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub exception: Option<String>,
    pub additional_data: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<LogEntry> for LogEntryResponse {
    fn from(entry: LogEntry) -> Self {
        Self {
            id: entry.id,
            service: entry.service,
            level: entry.level,
            message: entry.message,
            username: entry.username,
            request_id: entry.request_id,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            exception: entry.exception,
            additional_data: entry.additional_data,
            timestamp: entry.timestamp,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogSummaryResponse {
    pub total_logs: i64,
    pub error_count: i64,
    pub warning_count: i64,
    pub info_count: i64,
    pub service_counts: BTreeMap<String, i64>,
    pub level_counts: BTreeMap<String, i64>,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
}

impl From<LogSummary> for LogSummaryResponse {
    fn from(summary: LogSummary) -> Self {
        Self {
            total_logs: summary.total_logs,
            error_count: summary.error_count,
            warning_count: summary.warning_count,
            info_count: summary.info_count,
            service_counts: summary.service_counts,
            level_counts: summary.level_counts,
            from_date: summary.from_date,
            to_date: summary.to_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogStatResponse {
    pub date: NaiveDate,
    pub service: ServiceName,
    pub level: LogLevel,
    pub count: i64,
}

impl From<LogStat> for LogStatResponse {
    fn from(stat: LogStat) -> Self {
        Self {
            date: stat.date,
            service: stat.service,
            level: stat.level,
            count: stat.count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CleanupResponse {
    pub deleted_count: usize,
    pub before_date: DateTime<Utc>,
}

impl From<CleanupOutcome> for CleanupResponse {
    fn from(outcome: CleanupOutcome) -> Self {
        Self {
            deleted_count: outcome.deleted_count,
            before_date: outcome.before_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_parses_names() {
        let query = LogSearchQuery {
            service: Some("PaymentsService".to_string()),
            level: Some("error".to_string()),
            ..Default::default()
        };
        let (filter, _, _) = query.into_filter().unwrap();
        assert_eq!(filter.service, Some(ServiceName::PaymentsService));
        assert_eq!(filter.level, Some(LogLevel::Error));
    }

    #[test]
    fn test_search_query_rejects_unknown_level() {
        let query = LogSearchQuery {
            level: Some("loud".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            query.into_filter(),
            Err(AppError::Validation { ref field, .. }) if field == "level"
        ));
    }
}
