//! Server module for managing HTTP server lifecycle
//!
//! This module handles server initialization, startup, and graceful shutdown.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::signal;

use crate::api::routes::create_router;
use crate::config::{DatabaseBackend, Environment, Settings};
use crate::db::{AsyncDbPool, establish_async_connection_pool, run_pending_migrations};
use crate::jobs::JobScheduler;
use crate::state::AppState;

/// HTTP server manager
pub struct Server {
    settings: Settings,
    environment: Environment,
}

impl Server {
    pub fn new(settings: Settings, environment: Environment) -> Self {
        Self {
            settings,
            environment,
        }
    }

    /// Start the server and run until shutdown signal
    ///
    /// This method:
    /// 1. Connects to PostgreSQL (skipped for the in-memory backend)
    /// 2. Applies pending migrations when `database.auto_migrate` is set
    /// 3. Schedules background jobs
    /// 4. Serves HTTP until Ctrl+C or SIGTERM
    ///
    /// # Errors
    /// - Database connection pool or migration errors
    /// - Invalid job schedules
    /// - Address binding errors
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = &self.settings;
        tracing::info!(
            app_name = %settings.application.name,
            app_version = %settings.application.version,
            environment = %self.environment,
            "Application starting"
        );
        tracing::info!(
            host = %settings.server.host,
            port = settings.server.port,
            request_timeout = settings.server.request_timeout,
            services = ?settings.services.enabled(),
            "Server configuration loaded"
        );
        tracing::info!(
            expire_minutes = settings.jwt.expire_minutes,
            issuer = %settings.jwt.issuer,
            secret_configured = !settings.jwt.secret.is_empty(),
            "JWT configuration loaded"
        );

        let pool = self.connect_database().await?;

        let state = AppState::new(self.settings.clone(), self.environment, pool);

        let mut scheduler = JobScheduler::new().await?;
        scheduler
            .register(&self.settings.jobs, &state.services.logs)
            .await?;
        if scheduler.scheduled() > 0 {
            scheduler.start().await?;
        }

        let router = create_router(state);

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        if scheduler.scheduled() > 0
            && let Err(e) = scheduler.stop().await
        {
            tracing::warn!(error = %e, "Job scheduler did not stop cleanly");
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    async fn connect_database(&self) -> anyhow::Result<Option<AsyncDbPool>> {
        let database = &self.settings.database;
        if database.backend == DatabaseBackend::Memory {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            return Ok(None);
        }

        if database.auto_migrate {
            let applied = run_pending_migrations(&database.url).await?;
            tracing::info!(count = applied.len(), migrations = ?applied, "Migrations applied");
        }

        tracing::info!(
            max_connections = database.max_connections,
            min_connections = database.min_connections,
            connection_timeout = database.connection_timeout,
            "Initializing database connection pool"
        );
        let pool = establish_async_connection_pool(database).await?;
        tracing::info!("Database connection pool initialized");
        Ok(Some(pool))
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
///
/// A signal handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
