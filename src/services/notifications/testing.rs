//! Recording push provider for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::envelope::MessageEnvelope;
use super::provider::{DeliveryError, PushProvider};

/// Records every envelope it receives and answers with a fixed outcome.
#[derive(Clone, Default)]
pub struct RecordingProvider {
    sent: Arc<Mutex<Vec<MessageEnvelope>>>,
    fail: bool,
}

impl RecordingProvider {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<MessageEnvelope> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushProvider for RecordingProvider {
    async fn send(&self, envelope: &MessageEnvelope) -> Result<String, DeliveryError> {
        self.sent.lock().unwrap().push(envelope.clone());
        if self.fail {
            return Err(DeliveryError::Rejected {
                status: 400,
                code: "INVALID_ARGUMENT".to_string(),
                message: "simulated failure".to_string(),
            });
        }
        Ok(format!("projects/test/messages/{}", envelope.data["requestId"]))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
