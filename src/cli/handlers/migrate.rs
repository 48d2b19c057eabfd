//! Migrate command handler

use crate::config::{DatabaseBackend, Settings};
use crate::db::{pending_migrations, revert_migrations, run_pending_migrations};
use crate::error::{AppError, AppResult};

pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Applies pending migrations, lists them (`dry_run`), or reverts the last `rollback`.
    ///
    /// # Errors
    /// - The in-memory backend has no schema to migrate
    /// - Database connection or migration errors
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        let database = &self.config.database;
        if database.backend == DatabaseBackend::Memory {
            return Err(AppError::validation(
                "database.backend",
                "Migrations require the postgres backend",
            ));
        }
        if rollback == Some(0) {
            return Err(AppError::validation(
                "rollback_steps",
                "Number of rollback steps must be greater than 0",
            ));
        }
        database.validate()?;

        if dry_run {
            let pending = pending_migrations(&database.url).await?;
            if pending.is_empty() {
                println!("✓ No pending migrations - database is up to date");
            } else {
                println!("Found {} pending migration(s):", pending.len());
                print_list(&pending);
                println!("\nRun without --dry-run to apply these migrations");
            }
            return Ok(());
        }

        match rollback {
            Some(steps) => {
                println!("Rolling back {} migration(s)...", steps);
                let reverted = revert_migrations(&database.url, steps).await?;
                println!("✓ Rolled back {} migration(s):", reverted.len());
                print_list(&reverted);
                tracing::info!(count = reverted.len(), "Migrations reverted");
            }
            None => {
                println!("Running database migrations...");
                let applied = run_pending_migrations(&database.url).await?;
                if applied.is_empty() {
                    println!("✓ No migrations to apply - database is already up to date");
                } else {
                    println!("✓ Applied {} migration(s):", applied.len());
                    print_list(&applied);
                }
                tracing::info!(count = applied.len(), "Migrations applied");
            }
        }
        Ok(())
    }
}

fn print_list(names: &[String]) {
    for name in names {
        println!("  - {}", name);
    }
}
