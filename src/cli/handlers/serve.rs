//! Serve command handler

use crate::config::{DatabaseBackend, Environment, Settings};
use crate::error::AppResult;
use crate::server::Server;

pub struct ServeCommandHandler {
    config: Settings,
    environment: Environment,
}

impl ServeCommandHandler {
    pub fn new(config: Settings, environment: Environment) -> Self {
        Self {
            config,
            environment,
        }
    }

    /// Runs the server until shutdown, or only reports the effective
    /// configuration when `dry_run` is set.
    pub async fn execute(self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            self.validate_only()?;
            return Ok(());
        }
        Server::new(self.config, self.environment).run().await
    }

    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        let config = &self.config;
        println!("✓ Configuration is valid ({})", self.environment);
        println!("✓ Server would bind to: {}", config.server.address());
        match config.database.backend {
            DatabaseBackend::Postgres => println!(
                "✓ PostgreSQL pool of {}..{} connections (auto-migrate: {})",
                config.database.min_connections,
                config.database.max_connections,
                config.database.auto_migrate
            ),
            DatabaseBackend::Memory => println!("✓ In-memory store (data is not persisted)"),
        }
        println!("✓ Services: {}", config.services.enabled().join(", "));
        if config.jwt.secret.is_empty() {
            println!("! JWT secret is empty: login and protected routes will fail");
        }
        if self.environment.exposes_api_docs() {
            println!("✓ Swagger UI at /swagger-ui");
        }

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn memory_config() -> Settings {
        let mut config = Settings::default();
        config.database.backend = DatabaseBackend::Memory;
        config
    }

    #[tokio::test]
    async fn test_dry_run_accepts_valid_config() {
        let handler = ServeCommandHandler::new(memory_config(), Environment::Test);
        assert!(handler.execute(true).await.is_ok());
    }

    #[test]
    fn test_dry_run_rejects_invalid_config() {
        let mut config = memory_config();
        config.server.port = 0;
        let handler = ServeCommandHandler::new(config, Environment::Test);

        match handler.validate_only() {
            Err(AppError::Configuration { key, .. }) => assert_eq!(key, "server.port"),
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }
}
