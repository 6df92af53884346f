//! Relays validated requests to the configured push backend.

use std::sync::Arc;
use std::time::Instant;

use super::envelope::build_envelope;
use super::provider::{DeliveryError, PushProvider};
use crate::api::dto::NotificationRequest;

/// Builds the envelope for a request and hands it to the provider.
///
/// Exactly one provider call per request. Failures are neither retried nor
/// deduplicated.
#[derive(Clone)]
pub struct NotificationService {
    provider: Arc<dyn PushProvider>,
}

impl NotificationService {
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Send a validated request, returning the backend message id
    pub async fn send(&self, request: &NotificationRequest) -> Result<String, DeliveryError> {
        let envelope = build_envelope(request);
        let start = Instant::now();

        let result = self.provider.send(&envelope).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(message_id) => tracing::info!(
                provider = self.provider.name(),
                topic = %envelope.topic,
                request_id = %envelope.data["requestId"],
                message_id = %message_id,
                duration_ms,
                "Notification sent"
            ),
            Err(error) => tracing::error!(
                provider = self.provider.name(),
                topic = %envelope.topic,
                request_id = %envelope.data["requestId"],
                duration_ms,
                error = %error,
                detail = ?error,
                "Error sending notification"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifications::testing::RecordingProvider;
    use serde_json::json;

    fn request() -> NotificationRequest {
        serde_json::from_value(json!({
            "topic": "maids",
            "title": "New Request",
            "body": "A new request was placed",
            "requestId": 42,
            "issue": "leak"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_forwards_envelope_once() {
        let provider = RecordingProvider::succeeding();
        let service = NotificationService::new(Arc::new(provider.clone()));

        let id = service.send(&request()).await.unwrap();
        assert_eq!(id, "projects/test/messages/42");

        let sent = provider.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].topic, "maids");
        assert_eq!(sent[0].data["issue"], "leak");
        assert_eq!(sent[0].data["actionType"], "new_request");
        assert_eq!(service.provider_name(), "recording");
    }

    #[tokio::test]
    async fn test_send_failure_is_returned_without_retry() {
        let provider = RecordingProvider::failing();
        let service = NotificationService::new(Arc::new(provider.clone()));

        let err = service.send(&request()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected { .. }));
        assert_eq!(provider.sent().len(), 1);
    }
}
