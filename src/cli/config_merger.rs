//! Configuration merger for CLI arguments and config files
//!
//! This module handles merging CLI argument overrides with file-based configuration,
//! implementing the configuration precedence logic.

use std::path::PathBuf;

use super::parser::{Cli, Commands, Environment};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, settings::Settings};

/// Applies CLI overrides on top of file and environment configuration
///
/// CLI arguments have the highest priority. The merged result is validated
/// once, after every override has been applied.
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    /// Create a new configuration merger with base configuration
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration through [`ConfigLoader`]
    ///
    /// `config_path` replaces the layered `config/` directory with a single
    /// file; `env` replaces `ACCOUNT_SYNC_APP_ENV`.
    ///
    /// # Errors
    /// Returns ConfigError if a required file is missing or cannot be parsed
    pub fn load(
        config_path: Option<&PathBuf>,
        env: Option<Environment>,
    ) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(path) = config_path {
            loader = loader.with_config_file(path);
        }
        if let Some(env) = env {
            loader = loader.with_environment(env.into());
        }

        Ok(Self::new(loader.load_unvalidated()?))
    }

    /// Merge CLI arguments with the base configuration and validate the result
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Commands::Serve {
            host,
            port,
            log_level,
            ..
        } = &cli.command
        {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            // Command-level log level wins over --verbose/--quiet
            if let Some(level) = log_level {
                config.logger.level = (*level).into();
            }
        }

        config.validate()?;

        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InternalConfig, JwtConfig};
    use clap::Parser;

    fn create_valid_base_config() -> Settings {
        let mut config = Settings {
            jwt: JwtConfig {
                secret: "k".repeat(32),
                ..Default::default()
            },
            internal: InternalConfig {
                api_key: "internal-key".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        config.database.url = "postgres://localhost/test".to_string();
        config
    }

    fn merge(args: &[&str]) -> Result<Settings, ConfigError> {
        let cli = Cli::try_parse_from(args).unwrap();
        ConfigurationMerger::new(create_valid_base_config()).merge_cli_args(&cli)
    }

    #[test]
    fn test_verbose_and_quiet_flags() {
        let merged = merge(&["account-sync", "--verbose", "migrate"]).unwrap();
        assert_eq!(merged.logger.level, "debug");

        let merged = merge(&["account-sync", "--quiet", "migrate"]).unwrap();
        assert_eq!(merged.logger.level, "error");
    }

    #[test]
    fn test_serve_host_and_port() {
        let merged = merge(&[
            "account-sync",
            "serve",
            "products",
            "--host",
            "0.0.0.0",
            "--port",
            "3001",
        ])
        .unwrap();

        assert_eq!(merged.server.host, "0.0.0.0");
        assert_eq!(merged.server.port, 3001);
    }

    #[test]
    fn test_command_log_level_overrides_global() {
        let merged = merge(&[
            "account-sync",
            "--verbose",
            "serve",
            "accounts",
            "--log-level",
            "warn",
        ])
        .unwrap();

        assert_eq!(merged.logger.level, "warn");
    }

    #[test]
    fn test_merged_config_is_validated() {
        let mut base = create_valid_base_config();
        base.internal.api_key.clear();
        let cli = Cli::try_parse_from(["account-sync", "serve", "products"]).unwrap();

        let err = ConfigurationMerger::new(base).merge_cli_args(&cli).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, .. } if field == "internal.api_key"
        ));
    }

    #[test]
    fn test_load_from_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 4100

[database]
backend = "memory"
"#,
        )
        .unwrap();

        let merger = ConfigurationMerger::load(Some(&path), Some(Environment::Test)).unwrap();
        assert_eq!(merger.config().server.port, 4100);
    }
}
