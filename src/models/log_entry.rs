use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Service that produced a log entry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
pub enum ServiceName {
    UsersService,
    ProductsService,
    PaymentsService,
    LogsService,
}

impl ServiceName {
    pub const ALL: [ServiceName; 4] = [
        ServiceName::UsersService,
        ServiceName::ProductsService,
        ServiceName::PaymentsService,
        ServiceName::LogsService,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::UsersService => "UsersService",
            ServiceName::ProductsService => "ProductsService",
            ServiceName::PaymentsService => "PaymentsService",
            ServiceName::LogsService => "LogsService",
        }
    }
}

impl FromStr for ServiceName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid service '{}'. Valid services: {}",
                    s,
                    Self::ALL.map(|v| v.as_str()).join(", ")
                )
            })
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

text_column!(ServiceName);

/// Severity of a log entry, stored and rendered upper-case.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

/// Case-insensitive: `warning`, `Warning` and `WARNING` all parse.
impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == upper)
            .ok_or_else(|| {
                format!(
                    "Invalid level '{}'. Valid levels: {}",
                    s,
                    Self::ALL.map(|v| v.as_str()).join(", ")
                )
            })
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

text_column!(LogLevel);

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::log_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LogEntry {
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::log_entries)]
pub struct NewLogEntry {
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

/// The three columns the summary and stats reports aggregate over.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::log_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LogActivity {
    pub service: ServiceName,
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub service: Option<ServiceName>,
    pub level: Option<LogLevel>,
    pub username: Option<String>,
    /// Substring of the message
    pub search_text: Option<String>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.service.is_none_or(|v| v == entry.service)
            && self.level.is_none_or(|v| v == entry.level)
            && self
                .username
                .as_deref()
                .is_none_or(|v| entry.username.as_deref() == Some(v))
            && self
                .search_text
                .as_deref()
                .is_none_or(|v| entry.message.contains(v))
            && self.from_date.is_none_or(|v| entry.timestamp >= v)
            && self.to_date.is_none_or(|v| entry.timestamp <= v)
            && self
                .request_id
                .as_deref()
                .is_none_or(|v| entry.request_id.as_deref() == Some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse_is_case_insensitive() {
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!(" Critical ".parse::<LogLevel>(), Ok(LogLevel::Critical));
        let err = "verbose".parse::<LogLevel>().unwrap_err();
        assert!(err.contains("TRACE, DEBUG, INFO, WARNING, ERROR, CRITICAL"));
    }

    #[test]
    fn test_service_parse_is_exact() {
        assert_eq!("UsersService".parse::<ServiceName>(), Ok(ServiceName::UsersService));
        assert!("usersservice".parse::<ServiceName>().is_err());
    }

    #[test]
    fn test_level_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&LogLevel::Warning).unwrap(), "\"WARNING\"");
        assert_eq!(
            serde_json::to_string(&ServiceName::LogsService).unwrap(),
            "\"LogsService\""
        );
    }
}
