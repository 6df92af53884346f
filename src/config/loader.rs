//! Configuration loader for topic-relay
//!
//! `ConfigLoader` stacks TOML files and environment variables with the
//! precedence documented on the `config` module.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "RELAY_CONFIG_DIR";

const CONFIG_FILE_ENV: &str = "RELAY_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";

const ENV_PREFIX: &str = "RELAY";

/// Separator for nested keys: `RELAY_SERVER__PORT` -> `server.port`
const ENV_SEPARATOR: &str = "__";

/// Loads `Settings` from layered sources.
///
/// When neither `RELAY_CONFIG_DIR` nor `RELAY_CONFIG_FILE` is set and the
/// default `config/` directory does not exist, built-in defaults plus
/// environment variables are used. An explicitly configured directory must
/// contain `default.toml`.
#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// Set when the directory came from `RELAY_CONFIG_DIR`
    config_dir_explicit: bool,
    /// Single-file mode; skips layered loading
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a loader from `RELAY_CONFIG_DIR`, `RELAY_CONFIG_FILE` and `RELAY_APP_ENV`.
    ///
    /// # Errors
    ///
    /// `RELAY_CONFIG_DIR` and `RELAY_CONFIG_FILE` are mutually exclusive.
    pub fn new() -> Result<Self, ConfigError> {
        let explicit_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_file.is_some() && explicit_dir.is_some() {
            return Err(ConfigError::mutual_exclusivity(
                "RELAY_CONFIG_DIR and RELAY_CONFIG_FILE cannot both be set. \
                 Use RELAY_CONFIG_DIR for layered configuration or \
                 RELAY_CONFIG_FILE for a single configuration file.",
            ));
        }

        Ok(Self {
            config_dir_explicit: explicit_dir.is_some(),
            config_dir: explicit_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Loader that reads exactly one file (plus environment overrides)
    pub fn from_file<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_dir_explicit: false,
            config_file: Some(path.into()),
            environment: AppEnvironment::from_env(),
        }
    }

    /// Override the environment used to pick `{environment}.toml`
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    /// Load, deserialize and validate configuration from all sources
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = match &self.config_file {
            Some(config_file) => Self::add_file_source(builder, config_file, true)?,
            None => self.build_layered_config(builder)?,
        };

        // Environment variables always win
        let builder = Self::add_env_source(builder);

        builder.build().map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if !self.config_dir_explicit && !self.config_dir.exists() {
            return Ok(builder);
        }

        let default_path = self.config_dir.join("default.toml");
        let builder = Self::add_file_source(builder, &default_path, true)?;

        let env_path = self
            .config_dir
            .join(format!("{}.toml", self.environment.as_str()));
        let builder = Self::add_file_source(builder, &env_path, false)?;

        let local_path = self.config_dir.join("local.toml");
        Self::add_file_source(builder, &local_path, false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(required)))
    }

    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}
