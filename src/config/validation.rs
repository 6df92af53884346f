//! Configuration validation logic

use crate::config::error::ConfigError;
use crate::config::settings::{FcmConfig, FileSettings, LoggerSettings, ServerConfig, Settings};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::validation(
                "server.host",
                "Host address cannot be empty.",
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl FcmConfig {
    /// Validate push backend configuration.
    ///
    /// Credential presence is checked later, when the credential is loaded,
    /// so a config file can be validated on a machine without secrets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            ConfigError::validation("fcm.base_url", format!("Invalid URL '{}': {}", self.base_url, e))
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::validation(
                "fcm.base_url",
                "URL must use http or https protocol",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "fcm.timeout_seconds",
                "Timeout must be greater than 0 seconds.",
            ));
        }

        if self.credentials_path.is_none() && self.credentials_env.trim().is_empty() {
            return Err(ConfigError::validation(
                "fcm.credentials_env",
                "Either fcm.credentials_path or fcm.credentials_env must be set.",
            ));
        }

        if let Some(project_id) = &self.project_id
            && project_id.trim().is_empty()
        {
            return Err(ConfigError::validation(
                "fcm.project_id",
                "Project id cannot be blank when set.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        if self.max_size == 0 {
            return Err(ConfigError::validation(
                "logger.file.max_size",
                "Maximum file size must be greater than 0.",
            ));
        }

        if self.max_files == 0 {
            return Err(ConfigError::validation(
                "logger.file.max_files",
                "Maximum number of files must be greater than 0.",
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

impl Settings {
    /// Validate all sections, returning the first error encountered
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.fcm.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}
