//! Serve command handler
//!
//! Handles the serve command including dry-run validation and server startup.

use crate::config::{Settings, StoreBackend};
use crate::error::AppResult;
use crate::repositories::Repositories;
use crate::server::{Server, ServiceRole};

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
    role: ServiceRole,
}

impl ServeCommandHandler {
    pub fn new(config: Settings, role: ServiceRole) -> Self {
        Self { config, role }
    }

    /// Run the server, or only validate when `dry_run` is set
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Server startup errors (if not dry-run)
    pub async fn execute(self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            self.validate_only()?;
            return Ok(());
        }

        Server::new(self.config, self.role).run().await
    }

    /// Validate configuration and wiring without binding a socket
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        // Builds the notifier and outbound client against in-memory stores,
        // so SMTP and base URL mistakes surface here too.
        Server::new(self.config.clone(), self.role).build_router(&Repositories::in_memory())?;

        println!("✓ Configuration is valid");
        println!("✓ Role: {}", self.role);
        println!("✓ Server would bind to: {}", self.config.server.address());
        match self.config.database.backend {
            StoreBackend::Postgres => println!("✓ Database URL is configured"),
            StoreBackend::Memory => println!("✓ In-memory stores selected"),
        }
        if self.role == ServiceRole::Accounts {
            println!("✓ Products service at: {}", self.config.internal.products_base_url);
        }

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
