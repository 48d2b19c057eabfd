//! Range and format checks run after settings are deserialized.

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseBackend, DatabaseConfig, JobsConfig, JwtConfig, LoggerSettings, ServerConfig,
    ServicesConfig, Settings,
};

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

const MIN_SECRET_LEN: usize = 32;

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// The URL and pool bounds only matter for the Postgres backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == DatabaseBackend::Memory {
            return Ok(());
        }

        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required when backend is postgres.",
            ));
        }

        if !(self.url.starts_with("postgres://") || self.url.starts_with("postgresql://")) {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::validation(
                "database.min_connections",
                format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            ));
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "database.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl JwtConfig {
    /// An empty secret is accepted here; token issuance reports it instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.secret.is_empty() && self.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::validation(
                "jwt.secret",
                format!("JWT secret must be at least {} characters.", MIN_SECRET_LEN),
            ));
        }

        if self.issuer.trim().is_empty() {
            return Err(ConfigError::validation("jwt.issuer", "Issuer cannot be empty."));
        }

        if self.audience.trim().is_empty() {
            return Err(ConfigError::validation("jwt.audience", "Audience cannot be empty."));
        }

        if self.expire_minutes <= 0 {
            return Err(ConfigError::validation(
                "jwt.expire_minutes",
                "Token lifetime must be positive.",
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.file.enabled && self.file.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.file.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.file.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        self.clone().into_logger_config().map(|_| ())
    }
}

impl ServicesConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.users || self.products || self.payments || self.logs) {
            return Err(ConfigError::validation(
                "services",
                "At least one service group must be enabled.",
            ));
        }
        Ok(())
    }
}

impl JobsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let retention = &self.log_retention;
        if !retention.enabled {
            return Ok(());
        }

        if retention.cron.split_whitespace().count() != 6 {
            return Err(ConfigError::validation(
                "jobs.log_retention.cron",
                "Cron expression must have six fields (sec min hour day month weekday).",
            ));
        }

        if retention.retention_days == 0 {
            return Err(ConfigError::validation(
                "jobs.log_retention.retention_days",
                "Retention must be at least 1 day.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Returns the first failing section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.jwt.validate()?;
        self.logger.validate()?;
        self.services.validate()?;
        self.jobs.validate()?;
        Ok(())
    }
}
