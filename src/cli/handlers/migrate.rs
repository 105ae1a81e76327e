//! Migrate command handler
//!
//! Applies or lists the embedded schema migrations.

use crate::config::{Settings, StoreBackend};
use crate::db::{pending_migrations, run_migrations};
use crate::error::{AppError, AppResult};

/// Handler for the migrate command
pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute the migrate command
    ///
    /// # Errors
    /// - Memory backend selected (nothing to migrate)
    /// - Database connection or migration errors
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if self.config.database.backend == StoreBackend::Memory {
            return Err(AppError::Validation {
                field: "database.backend".to_string(),
                reason: "Migrations need the postgres backend".to_string(),
            });
        }
        self.config.database.validate()?;

        if dry_run {
            self.show_pending_migrations().await
        } else {
            self.apply_migrations().await
        }
    }

    async fn show_pending_migrations(&self) -> AppResult<()> {
        println!("Checking for pending migrations...");

        let pending = pending_migrations(&self.config.database.url).await?;
        if pending.is_empty() {
            println!("✓ No pending migrations found - database is up to date");
        } else {
            println!("Found {} pending migration(s):", pending.len());
            for name in &pending {
                println!("  - {}", name);
            }
            println!("\nRun without --dry-run to apply these migrations");
        }

        Ok(())
    }

    async fn apply_migrations(&self) -> AppResult<()> {
        println!("Running database migrations...");

        let applied = run_migrations(&self.config.database.url).await?;
        tracing::info!(count = applied.len(), "Migrations applied");

        if applied.is_empty() {
            println!("✓ No migrations to apply - database is already up to date");
        } else {
            println!("✓ Applied {} migration(s):", applied.len());
            for name in &applied {
                println!("  - {}", name);
            }
        }

        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_handler_new() {
        let config = Settings::default();
        let handler = MigrateCommandHandler::new(config.clone());
        assert_eq!(handler.config(), &config);
    }

    #[tokio::test]
    async fn test_memory_backend_is_rejected() {
        let mut config = Settings::default();
        config.database.backend = StoreBackend::Memory;

        let err = MigrateCommandHandler::new(config).execute(false).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation { ref field, .. } if field == "database.backend"
        ));
    }

    #[tokio::test]
    async fn test_missing_database_url_is_rejected() {
        let err = MigrateCommandHandler::new(Settings::default())
            .execute(true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration { ref key, .. } if key == "database.url"));
    }
}
