//! Layered configuration: `default.toml`, `{environment}.toml`, `local.toml`,
//! then `STOREFRONT_*` environment variables (highest priority).

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    DatabaseBackend, DatabaseConfig, JobsConfig, JwtConfig, LogRetentionJobConfig,
    LoggerSettings, ServerConfig, ServicesConfig, Settings,
};
