//! Configuration merger for CLI arguments and config files
//!
//! CLI arguments override file and environment configuration.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, settings::Settings};

/// Applies CLI overrides on top of file-based configuration
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration the way the CLI asks for it.
    ///
    /// `--config` selects single-file mode; otherwise the layered loader is
    /// used. `--env` picks the environment layer in both cases.
    ///
    /// # Errors
    /// Returns ConfigError if loading or validation fails
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let loader = match &cli.config {
            Some(path) => ConfigLoader::from_file(path.clone()),
            None => ConfigLoader::new()?,
        };
        let loader = match cli.env {
            Some(env) => loader.with_environment(env.into()),
            None => loader,
        };

        Ok(Self::new(loader.load()?))
    }

    /// Merge CLI arguments with the base configuration and validate the result.
    ///
    /// Precedence, highest first: `serve --log-level`, `--verbose`/`--quiet`,
    /// then the loaded configuration.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(command) = &cli.command {
            Self::apply_command_overrides(&mut config, command);
        }

        config.validate()?;

        Ok(config)
    }

    fn apply_command_overrides(config: &mut Settings, command: &Commands) {
        match command {
            Commands::Serve {
                host,
                port,
                log_level,
                dry_run: _,
            } => {
                if let Some(host_addr) = host {
                    config.server.host = host_addr.clone();
                }
                if let Some(port_num) = port {
                    config.server.port = *port_num;
                }
                if let Some(level) = log_level {
                    config.logger.level = level.as_str().to_string();
                }
            }
        }
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parser::Cli;
    use crate::config::loader::tests::TEST_MUTEX;
    use clap::Parser;

    fn merge(args: &[&str]) -> Settings {
        let merger = ConfigurationMerger::new(Settings::default());
        let cli = Cli::try_parse_from(args).unwrap();
        merger.merge_cli_args(&cli).unwrap()
    }

    #[test]
    fn test_configuration_merger_new() {
        let base_config = Settings::default();
        let merger = ConfigurationMerger::new(base_config.clone());
        assert_eq!(merger.config(), &base_config);
    }

    #[test]
    fn test_no_overrides_keeps_base() {
        assert_eq!(merge(&["topic-relay"]), Settings::default());
    }

    #[test]
    fn test_verbose_and_quiet_flags() {
        assert_eq!(merge(&["topic-relay", "--verbose"]).logger.level, "debug");
        assert_eq!(merge(&["topic-relay", "--quiet"]).logger.level, "error");
    }

    #[test]
    fn test_serve_host_and_port() {
        let merged = merge(&["topic-relay", "serve", "--host", "0.0.0.0", "--port", "8080"]);
        assert_eq!(merged.server.host, "0.0.0.0");
        assert_eq!(merged.server.port, 8080);
    }

    #[test]
    fn test_command_log_level_overrides_global() {
        let merged = merge(&["topic-relay", "--verbose", "serve", "--log-level", "warn"]);
        assert_eq!(merged.logger.level, "warn");
    }

    #[test]
    fn test_from_cli_with_config_file() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, "[server]\nport = 4321\n\n[fcm]\nproject_id = \"from-file\"\n")
            .unwrap();

        let cli = Cli::try_parse_from([
            "topic-relay",
            "--config",
            path.to_str().unwrap(),
            "serve",
            "--host",
            "0.0.0.0",
        ])
        .unwrap();

        let merger = ConfigurationMerger::from_cli(&cli).unwrap();
        let merged = merger.merge_cli_args(&cli).unwrap();
        assert_eq!(merged.server.port, 4321);
        assert_eq!(merged.server.host, "0.0.0.0");
        assert_eq!(merged.fcm.project_id.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_from_cli_rejects_invalid_file() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, "[server]\nrequest_timeout = 0\n").unwrap();

        let cli = Cli::try_parse_from(["topic-relay", "--config", path.to_str().unwrap()]).unwrap();
        assert!(matches!(
            ConfigurationMerger::from_cli(&cli),
            Err(ConfigError::ValidationError { field, .. }) if field == "server.request_timeout"
        ));
    }
}
