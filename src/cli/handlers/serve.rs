//! Serve command handler
//!
//! Builds the push provider (which loads the credential) and either starts
//! the server or, for `--dry-run`, reports what it would do.

use std::sync::Arc;

use anyhow::Context;

use crate::config::settings::Settings;
use crate::server::Server;
use crate::services::notifications::{FcmProvider, PushProvider};

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Start the server, or validate everything and exit when `dry_run` is set.
    ///
    /// # Errors
    /// - Credential loading errors (before anything binds)
    /// - Address binding and server runtime errors
    pub async fn execute(&self, dry_run: bool) -> anyhow::Result<()> {
        let provider = self.build_provider()?;

        if dry_run {
            for line in self.dry_run_report(&provider) {
                println!("{}", line);
            }
            return Ok(());
        }

        Server::new(self.config.clone(), Arc::new(provider))
            .run()
            .await
    }

    fn build_provider(&self) -> anyhow::Result<FcmProvider> {
        let provider = FcmProvider::from_config(&self.config.fcm)
            .context("Push backend configuration error")?;
        tracing::info!(
            provider = provider.name(),
            project_id = %provider.project_id(),
            validate_only = self.config.fcm.validate_only,
            "Push provider initialized"
        );
        Ok(provider)
    }

    fn dry_run_report(&self, provider: &FcmProvider) -> Vec<String> {
        let mut report = vec![
            "✓ Configuration is valid".to_string(),
            format!("✓ Server would bind to: {}", self.config.server.address()),
            format!(
                "✓ Push provider: {} (project {})",
                provider.name(),
                provider.project_id()
            ),
            format!("✓ FCM endpoint: {}", self.config.fcm.base_url),
        ];
        if self.config.fcm.validate_only {
            report.push("! validate_only is set: messages will not be delivered".to_string());
        }
        report.push(
            "Dry run completed successfully - configuration is ready for deployment".to_string(),
        );
        report
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
