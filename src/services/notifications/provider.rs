//! Push backend abstraction.
//!
//! `PushProvider` is the seam between request handling and the delivery
//! backend. The production implementation is `FcmProvider`; tests inject
//! recording fakes.

use async_trait::async_trait;
use thiserror::Error;

use super::envelope::MessageEnvelope;

/// Why a send did not go through.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Network failure, timeout or an unreadable response stream
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("Rejected by backend (HTTP {status}, {code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    /// No usable access token could be obtained
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A success status with a body that could not be understood
    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),
}

/// Trait for push backends.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// request for the lifetime of the process.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Deliver `envelope` to its topic, returning the backend message id
    async fn send(&self, envelope: &MessageEnvelope) -> Result<String, DeliveryError>;

    /// Short identifier for logs and the health probe
    fn name(&self) -> &'static str;
}
