//! Push notification delivery.
//!
//! `PushProvider` is the backend seam; `FcmProvider` is the production
//! implementation and `NotificationService` drives it from request handlers.

mod envelope;
mod fcm_provider;
mod notification_service;
mod provider;

#[cfg(test)]
pub(crate) mod testing;

pub use envelope::{
    AndroidConfig, AndroidMessagePriority, AndroidNotification, EnvelopeNotification,
    MessageEnvelope, NotificationPriority, build_envelope,
};
pub use fcm_provider::FcmProvider;
pub use notification_service::NotificationService;
pub use provider::{DeliveryError, PushProvider};
