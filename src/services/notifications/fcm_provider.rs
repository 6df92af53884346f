//! Firebase Cloud Messaging (HTTP v1) push provider.
//!
//! API reference: https://firebase.google.com/docs/reference/fcm/rest/v1/projects.messages/send

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::envelope::MessageEnvelope;
use super::provider::{DeliveryError, PushProvider};
use crate::config::FcmConfig;
use crate::external::client::build_http_client;
use crate::external::google::{CredentialError, ServiceAccountCredential, TokenSource};

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a MessageEnvelope,
    validate_only: bool,
}

#[derive(Deserialize)]
struct SendResponse {
    name: String,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<GoogleErrorDetail>,
}

#[derive(Deserialize)]
struct GoogleErrorDetail {
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

/// Sends envelopes to FCM, authenticating as a service account.
pub struct FcmProvider {
    client: reqwest::Client,
    tokens: TokenSource,
    send_url: String,
    project_id: String,
    validate_only: bool,
}

impl FcmProvider {
    pub fn new(
        config: &FcmConfig,
        credential: ServiceAccountCredential,
        client: reqwest::Client,
    ) -> Result<Self, CredentialError> {
        let project_id = credential.resolve_project_id(config)?;
        let tokens = TokenSource::new(client.clone(), &credential)?;
        let send_url = format!(
            "{}/v1/projects/{}/messages:send",
            config.base_url.trim_end_matches('/'),
            project_id
        );

        Ok(Self {
            client,
            tokens,
            send_url,
            project_id,
            validate_only: config.validate_only,
        })
    }

    /// Load the credential named by `config` and build the provider
    pub fn from_config(config: &FcmConfig) -> anyhow::Result<Self> {
        let credential = ServiceAccountCredential::from_config(config)
            .context("Failed to load service-account credential")?;
        let client = build_http_client(Duration::from_secs(config.timeout_seconds))
            .context("Failed to build HTTP client")?;

        Ok(Self::new(config, credential, client)?)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn rejection(status: reqwest::StatusCode, body: &str) -> DeliveryError {
        match serde_json::from_str::<GoogleErrorBody>(body) {
            Ok(GoogleErrorBody { error }) => {
                // FCM puts its own code (UNREGISTERED, QUOTA_EXCEEDED, ..) in details
                let code = error
                    .details
                    .into_iter()
                    .find_map(|d| d.error_code)
                    .unwrap_or(error.status);
                DeliveryError::Rejected {
                    status: status.as_u16(),
                    code,
                    message: error.message,
                }
            }
            Err(_) => DeliveryError::Rejected {
                status: status.as_u16(),
                code: status
                    .canonical_reason()
                    .unwrap_or("UNKNOWN")
                    .to_string(),
                message: body.chars().take(512).collect(),
            },
        }
    }
}

#[async_trait]
impl PushProvider for FcmProvider {
    async fn send(&self, envelope: &MessageEnvelope) -> Result<String, DeliveryError> {
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| DeliveryError::Auth(e.to_string()))?;

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(token)
            .json(&SendRequest {
                message: envelope,
                validate_only: self.validate_only,
            })
            .send()
            .await
            .map_err(DeliveryError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(DeliveryError::Transport)?;

        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.tokens.invalidate().await;
            }
            return Err(Self::rejection(status, &body));
        }

        let parsed: SendResponse = serde_json::from_str(&body)
            .map_err(|e| DeliveryError::InvalidResponse(format!("{}: {}", e, body)))?;

        Ok(parsed.name)
    }

    fn name(&self) -> &'static str {
        "fcm"
    }
}
