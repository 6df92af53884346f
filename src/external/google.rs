//! Google service-account credentials and OAuth2 access tokens.
//!
//! A service account signs a short-lived RS256 JWT assertion with its private
//! key and trades it at `token_uri` for a bearer token
//! (`urn:ietf:params:oauth:grant-type:jwt-bearer`).

use std::fmt;
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::FcmConfig;

pub const FIREBASE_MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens this close to expiry are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 60;

/// Problems loading or using a service-account credential. Fatal at startup.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(
        "No service-account credential configured: set fcm.credentials_path or the {0} environment variable"
    )]
    Missing(String),

    #[error("Failed to read credential file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid service-account JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Credential field '{0}' is missing or empty")]
    MissingField(&'static str),

    #[error("Invalid private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
}

/// Failures while obtaining an access token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to sign assertion: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("Token request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Token endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Unexpected token response: {0}")]
    InvalidResponse(String),
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The subset of a service-account key file the relay needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountCredential {
    #[serde(rename = "type", default)]
    pub account_type: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountCredential")
            .field("account_type", &self.account_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountCredential {
    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        let credential: Self = serde_json::from_str(json)?;

        if credential.private_key.trim().is_empty() {
            return Err(CredentialError::MissingField("private_key"));
        }
        if credential.client_email.trim().is_empty() {
            return Err(CredentialError::MissingField("client_email"));
        }
        if credential.token_uri.trim().is_empty() {
            return Err(CredentialError::MissingField("token_uri"));
        }

        Ok(credential)
    }

    pub fn from_file(path: &Path) -> Result<Self, CredentialError> {
        let json = std::fs::read_to_string(path).map_err(|source| CredentialError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load from `credentials_path` when set, otherwise from the inline JSON
    /// in the environment variable named by `credentials_env`.
    pub fn from_config(config: &FcmConfig) -> Result<Self, CredentialError> {
        if let Some(path) = &config.credentials_path {
            return Self::from_file(Path::new(path));
        }

        match std::env::var(&config.credentials_env) {
            Ok(json) if !json.trim().is_empty() => Self::from_json(&json),
            _ => Err(CredentialError::Missing(config.credentials_env.clone())),
        }
    }

    /// `fcm.project_id` wins over the credential's own project
    pub fn resolve_project_id(&self, config: &FcmConfig) -> Result<String, CredentialError> {
        config
            .project_id
            .as_deref()
            .or(self.project_id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(CredentialError::MissingField("project_id"))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    /// Unix seconds
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        now + REFRESH_MARGIN_SECS < self.expires_at
    }
}

/// Hands out access tokens, fetching a new one only when the cached one is
/// about to expire.
///
/// The cache lock is held across the refresh so concurrent callers wait for
/// one exchange instead of racing.
pub struct TokenSource {
    client: reqwest::Client,
    client_email: String,
    token_uri: String,
    key_id: Option<String>,
    encoding_key: EncodingKey,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(
        client: reqwest::Client,
        credential: &ServiceAccountCredential,
    ) -> Result<Self, CredentialError> {
        let encoding_key = EncodingKey::from_rsa_pem(credential.private_key.as_bytes())
            .map_err(CredentialError::InvalidKey)?;

        Ok(Self {
            client,
            client_email: credential.client_email.clone(),
            token_uri: credential.token_uri.clone(),
            key_id: credential.private_key_id.clone(),
            encoding_key,
            cache: Mutex::new(None),
        })
    }

    pub async fn access_token(&self) -> Result<String, TokenError> {
        let mut cache = self.cache.lock().await;
        let now = Timestamp::now().as_second();

        if let Some(token) = cache.as_ref()
            && token.is_fresh(now)
        {
            return Ok(token.access_token.clone());
        }

        let token = self.fetch(now).await?;
        tracing::debug!(expires_at = token.expires_at, "Fetched new access token");
        let access_token = token.access_token.clone();
        *cache = Some(token);
        Ok(access_token)
    }

    /// Drop the cached token, e.g. after the backend answered 401
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    fn sign_assertion(&self, now: i64) -> Result<String, TokenError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: FIREBASE_MESSAGING_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(TokenError::Sign)
    }

    async fn fetch(&self, now: i64) -> Result<CachedToken, TokenError> {
        let assertion = self.sign_assertion(now)?;

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(TokenError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(TokenError::Transport)?;

        if !status.is_success() {
            return Err(TokenError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| TokenError::InvalidResponse(e.to_string()))?;

        Ok(CachedToken {
            access_token: parsed.access_token,
            expires_at: now + parsed.expires_in,
        })
    }
}
