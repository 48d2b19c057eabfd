//! Settings structures deserialized from TOML layers and `STOREFRONT_*` variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig, RotationConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "storefront".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/storefront.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024
}

fn default_max_files() -> usize {
    5
}

fn default_jwt_issuer() -> String {
    "storefront".to_string()
}

fn default_jwt_audience() -> String {
    "storefront-clients".to_string()
}

fn default_expire_minutes() -> i64 {
    60
}

fn default_retention_cron() -> String {
    "0 0 3 * * *".to_string()
}

fn default_retention_days() -> u32 {
    90
}

// ============================================================================
// Application / Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

// ============================================================================
// Database
// ============================================================================

/// Where repositories keep their rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    /// Process-local maps; nothing survives a restart
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseBackend,

    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Apply embedded migrations when the server starts
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

// ============================================================================
// JWT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret. Left empty, the server starts but cannot issue or verify tokens.
    #[serde(default)]
    pub secret: String,

    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,

    #[serde(default = "default_jwt_audience")]
    pub audience: String,

    #[serde(default = "default_expire_minutes")]
    pub expire_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: default_jwt_issuer(),
            audience: default_jwt_audience(),
            expire_minutes: default_expire_minutes(),
        }
    }
}

// ============================================================================
// Logger
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSettings {
    /// Bytes before the active file is rotated
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default)]
    pub compress: bool,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            max_files: default_max_files(),
            compress: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// One of `full`, `compact`, `json`
    #[serde(default = "default_log_format")]
    pub format: String,

    #[serde(default)]
    pub rotation: RotationSettings,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: true,
            format: default_log_format(),
            rotation: RotationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Converts the file representation into the runtime logger configuration.
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let format = self
            .file
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format", e.to_string()))?;

        let config = LoggerConfig {
            console: ConsoleConfig {
                enabled: self.console.enabled,
                colored: self.console.colored,
            },
            file: FileConfig {
                enabled: self.file.enabled,
                path: PathBuf::from(self.file.path),
                append: self.file.append,
                format,
                rotation: RotationConfig {
                    max_size: self.file.rotation.max_size,
                    max_files: self.file.rotation.max_files,
                    compress: self.file.rotation.compress,
                },
            },
            level: self.level,
        };

        config
            .validate()
            .map_err(|e| ConfigError::validation("logger", e.to_string()))?;
        Ok(config)
    }
}

// ============================================================================
// Service groups and jobs
// ============================================================================

/// Which route groups the process serves. One binary can run every
/// service or a single one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_true")]
    pub users: bool,

    /// Products and categories
    #[serde(default = "default_true")]
    pub products: bool,

    /// Payments and payment methods
    #[serde(default = "default_true")]
    pub payments: bool,

    #[serde(default = "default_true")]
    pub logs: bool,
}

impl ServicesConfig {
    /// Names of the enabled groups, in a fixed order.
    pub fn enabled(&self) -> Vec<&'static str> {
        [
            ("users", self.users),
            ("products", self.products),
            ("payments", self.payments),
            ("logs", self.logs),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect()
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            users: true,
            products: true,
            payments: true,
            logs: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRetentionJobConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Six-field cron expression (seconds first)
    #[serde(default = "default_retention_cron")]
    pub cron: String,

    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for LogRetentionJobConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cron: default_retention_cron(),
            retention_days: default_retention_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JobsConfig {
    #[serde(default)]
    pub log_retention: LogRetentionJobConfig,
}

// ============================================================================
// Root
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub jwt: JwtConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub services: ServicesConfig,

    #[serde(default)]
    pub jobs: JobsConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_database_config() -> impl Strategy<Value = DatabaseConfig> {
        (
            prop_oneof![Just(DatabaseBackend::Postgres), Just(DatabaseBackend::Memory)],
            "postgres://[a-z]{1,8}@localhost/[a-z]{1,8}",
            1u32..=50,
            any::<bool>(),
        )
            .prop_map(|(backend, url, max_connections, auto_migrate)| DatabaseConfig {
                backend,
                url,
                max_connections,
                min_connections: 1,
                connection_timeout: 30,
                auto_migrate,
            })
    }

    fn arb_jwt_config() -> impl Strategy<Value = JwtConfig> {
        ("[a-zA-Z0-9]{32,48}", "[a-z]{3,12}", 1i64..=1440).prop_map(
            |(secret, issuer, expire_minutes)| JwtConfig {
                secret,
                audience: format!("{}-clients", issuer),
                issuer,
                expire_minutes,
            },
        )
    }

    fn arb_services() -> impl Strategy<Value = ServicesConfig> {
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
            |(users, products, payments, logs)| ServicesConfig {
                users,
                products,
                payments,
                logs,
            },
        )
    }

    fn arb_settings() -> impl Strategy<Value = Settings> {
        (arb_database_config(), arb_jwt_config(), arb_services(), 1u16..=u16::MAX).prop_map(
            |(database, jwt, services, port)| Settings {
                server: ServerConfig {
                    port,
                    ..Default::default()
                },
                database,
                jwt,
                services,
                ..Default::default()
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_settings_survive_toml(settings in arb_settings()) {
            let toml_str = toml::to_string(&settings).expect("serialize");
            let back: Settings = toml::from_str(&toml_str).expect("deserialize");
            prop_assert_eq!(settings, back);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.application.name, "storefront");
        assert_eq!(settings.application.version, crate::pkg_version());
        assert_eq!(settings.server.address(), "127.0.0.1:8080");
        assert_eq!(settings.database.backend, DatabaseBackend::Postgres);
        assert_eq!(settings.jwt.expire_minutes, 60);
        assert!(settings.services.users && settings.services.logs);
        assert!(!settings.jobs.log_retention.enabled);
        assert_eq!(settings.jobs.log_retention.retention_days, 90);
    }

    #[test]
    fn test_backend_parses_lowercase() {
        let config: DatabaseConfig = toml::from_str("backend = \"memory\"").unwrap();
        assert_eq!(config.backend, DatabaseBackend::Memory);
        assert!(toml::from_str::<DatabaseConfig>("backend = \"sqlite\"").is_err());
    }

    #[test]
    fn test_into_logger_config() {
        let settings = LoggerSettings {
            level: "debug".to_string(),
            file: FileSettings {
                enabled: true,
                format: "compact".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = settings.into_logger_config().unwrap();
        assert_eq!(config.level, "debug");
        assert!(config.file.enabled);
        assert_eq!(config.file.format, LogFormat::Compact);
        assert_eq!(config.file.path, PathBuf::from("logs/storefront.log"));
    }

    #[test]
    fn test_into_logger_config_rejects_unknown_format() {
        let settings = LoggerSettings {
            file: FileSettings {
                format: "xml".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        match settings.into_logger_config() {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "logger.file.format")
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }
}
