//! Outbound message envelope and its construction from a request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::dto::NotificationRequest;

pub const DEFAULT_ACTION_TYPE: &str = "new_request";

pub const ANDROID_CHANNEL_ID: &str = "request_channel";

pub const ANDROID_SOUND: &str = "ringtone";

/// Message handed to the push backend, addressed to a topic.
///
/// `data` is a `BTreeMap` so the serialized form is stable for equal input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub topic: String,
    pub notification: EnvelopeNotification,
    pub data: BTreeMap<String, String>,
    pub android: AndroidConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeNotification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidConfig {
    pub priority: AndroidMessagePriority,
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AndroidMessagePriority {
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidNotification {
    pub channel_id: String,
    pub sound: String,
    pub notification_priority: NotificationPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPriority {
    PriorityDefault,
    PriorityHigh,
    PriorityMax,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            priority: AndroidMessagePriority::High,
            notification: AndroidNotification {
                channel_id: ANDROID_CHANNEL_ID.to_string(),
                sound: ANDROID_SOUND.to_string(),
                notification_priority: NotificationPriority::PriorityHigh,
            },
        }
    }
}

/// Build the envelope for a validated request.
///
/// Absent metadata becomes `""` and an absent or empty `actionType` becomes
/// `new_request`. Pure: equal requests give equal envelopes.
pub fn build_envelope(request: &NotificationRequest) -> MessageEnvelope {
    let text = |field: &Option<String>| field.clone().unwrap_or_default();

    let action_type = request
        .action_type
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_ACTION_TYPE)
        .to_string();

    let data = BTreeMap::from([
        ("requestId".to_string(), text(&request.request_id)),
        ("actionType".to_string(), action_type),
        ("serviceType".to_string(), text(&request.service_type)),
        ("issue".to_string(), text(&request.issue)),
        ("block".to_string(), text(&request.block)),
        ("flat".to_string(), text(&request.flat)),
        ("time".to_string(), text(&request.time)),
    ]);

    MessageEnvelope {
        topic: text(&request.topic),
        notification: EnvelopeNotification {
            title: text(&request.title),
            body: text(&request.body),
        },
        data,
        android: AndroidConfig::default(),
    }
}
