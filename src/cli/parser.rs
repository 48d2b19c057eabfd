//! CLI argument parsing with clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Users, catalog, payments and log services behind one HTTP server
#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Users, catalog, payments and log services behind one HTTP server")]
#[command(long_about = "
Storefront serves four REST services (users, products, payments, logs) from a
single process. Each group can be switched off in the [services] config section.

EXAMPLES:
    # Start the server with default configuration
    storefront serve

    # Bind to all interfaces on a custom port
    storefront serve --host 0.0.0.0 --port 9000

    # Use the test profile (in-memory store)
    storefront --env test serve

    # Check configuration without starting server
    storefront serve --dry-run

    # Apply, preview or roll back migrations
    storefront migrate
    storefront migrate --dry-run
    storefront migrate --rollback 1

    # Bootstrap the first administrator
    storefront create-admin --username admin --email admin@example.com --password s3cret!
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Replaces the layered `config/` directory lookup. Environment variables
    /// (`STOREFRONT_*`) still apply on top.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override `STOREFRONT_APP_ENV`
    ///
    /// Selects the `{env}.toml` layer and whether Swagger UI is mounted.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web server (default)
    ///
    /// Examples:
    ///   storefront serve                           # Start with defaults
    ///   storefront serve --host 0.0.0.0 --port 80  # Bind to all interfaces on port 80
    ///   storefront serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override; wins over --verbose and --quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Database migration operations
    ///
    /// Examples:
    ///   storefront migrate                    # Apply all pending migrations
    ///   storefront migrate --dry-run          # Show pending migrations without applying
    ///   storefront migrate --rollback 3       # Roll back the last 3 migrations
    Migrate {
        /// Show pending migrations without applying
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of migrations to roll back (1-100)
        #[arg(
            long,
            value_name = "STEPS",
            conflicts_with = "dry_run",
            value_parser = super::validation::validate_rollback_steps
        )]
        rollback: Option<u32>,
    },
    /// Create an account with the Admin role
    ///
    /// Registration over HTTP always yields role User, so the first
    /// administrator is created here.
    CreateAdmin {
        #[arg(long, value_parser = super::validation::validate_username)]
        username: String,

        #[arg(long)]
        email: String,

        /// At least 6 characters
        #[arg(long, env = "STOREFRONT_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["storefront", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["storefront"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.env.is_none());
        assert!(!cli.verbose && !cli.quiet);
    }

    #[test]
    fn test_serve_arguments() {
        let cli = Cli::try_parse_from([
            "storefront", "--env", "prod", "serve", "--host", "0.0.0.0", "--port", "9000",
            "--log-level", "warning",
        ])
        .unwrap();
        assert_eq!(cli.env, Some(Environment::Production));
        match cli.command {
            Some(Commands::Serve { host, port, log_level, dry_run }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(9000));
                assert_eq!(log_level, Some(LogLevel::Warn));
                assert!(!dry_run);
            }
            other => panic!("Expected Serve, got {:?}", other),
        }
    }

    #[test]
    fn test_migrate_flags_conflict() {
        let err = Cli::try_parse_from(["storefront", "migrate", "--dry-run", "--rollback", "2"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_create_admin_arguments() {
        let cli = Cli::try_parse_from([
            "storefront", "create-admin", "--username", "root", "--email", "root@example.com",
            "--password", "hunter22",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::CreateAdmin { username, email, password }) => {
                assert_eq!(username, "root");
                assert_eq!(email, "root@example.com");
                assert_eq!(password, "hunter22");
            }
            other => panic!("Expected CreateAdmin, got {:?}", other),
        }
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let err = Cli::try_parse_from(["storefront", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
