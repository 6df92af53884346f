//! Inbound notification request.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::scalar::{optional_scalar, required_scalar};

/// Legal topic names: 1 to 900 of `[a-zA-Z0-9-_.~%]`
static TOPIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.~%-]{1,900}$").expect("topic pattern is a valid regex")
});

/// Request to fan a notification out to every subscriber of `topic`.
///
/// `requestId` and the metadata fields accept either strings or numbers;
/// numbers are forwarded in their JSON textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "topic": "maids",
    "title": "New Request",
    "body": "A new request was placed",
    "requestId": 42,
    "serviceType": "plumbing",
    "flat": "A-101"
}))]
pub struct NotificationRequest {
    /// Topic whose subscribers receive the notification
    #[validate(
        required(message = "topic is required"),
        length(min = 1, message = "topic must not be empty"),
        regex(path = *TOPIC_RE, message = "topic must be 1-900 characters of [a-zA-Z0-9-_.~%]")
    )]
    #[schema(value_type = String, example = "maids")]
    pub topic: Option<String>,

    #[validate(
        required(message = "title is required"),
        length(min = 1, message = "title must not be empty")
    )]
    #[schema(value_type = String, example = "New Request")]
    pub title: Option<String>,

    #[validate(
        required(message = "body is required"),
        length(min = 1, message = "body must not be empty")
    )]
    #[schema(value_type = String, example = "A new request was placed")]
    pub body: Option<String>,

    /// Request identifier, string or number
    #[serde(rename = "requestId", default, deserialize_with = "required_scalar")]
    #[validate(
        required(message = "requestId is required"),
        length(min = 1, message = "requestId must not be empty")
    )]
    #[schema(value_type = String, example = "42")]
    pub request_id: Option<String>,

    /// Defaults to `new_request` when absent or empty
    #[schema(example = "new_request")]
    pub action_type: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub service_type: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub issue: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub block: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub flat: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> NotificationRequest {
        serde_json::from_value(value).unwrap()
    }

    fn failing_fields(request: &NotificationRequest) -> Vec<String> {
        let errors = request.validate().unwrap_err();
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort();
        fields
    }

    #[test]
    fn test_full_request_is_valid() {
        let request = parse(json!({
            "topic": "maids",
            "title": "New Request",
            "body": "A new request was placed",
            "requestId": "42",
            "serviceType": "plumbing"
        }));
        assert!(request.validate().is_ok());
        assert_eq!(request.request_id.as_deref(), Some("42"));
        assert_eq!(request.service_type.as_deref(), Some("plumbing"));
        assert!(request.issue.is_none());
    }

    #[test]
    fn test_numeric_fields_are_coerced() {
        let request = parse(json!({
            "topic": "t",
            "title": "x",
            "body": "y",
            "requestId": 42,
            "block": 7,
            "time": 1700000000
        }));
        assert!(request.validate().is_ok());
        assert_eq!(request.request_id.as_deref(), Some("42"));
        assert_eq!(request.block.as_deref(), Some("7"));
        assert_eq!(request.time.as_deref(), Some("1700000000"));
    }

    #[test]
    fn test_missing_required_fields_fail_validation() {
        let request = parse(json!({"topic": "maids", "title": "New Request"}));
        assert_eq!(failing_fields(&request), vec!["body", "requestId"]);
    }

    #[test]
    fn test_empty_required_fields_fail_validation() {
        let request = parse(json!({"topic": "", "title": "", "body": "b", "requestId": ""}));
        assert_eq!(failing_fields(&request), vec!["requestId", "title", "topic"]);
    }

    #[test]
    fn test_topic_charset_is_enforced() {
        let request = parse(json!({
            "topic": "bad topic!",
            "title": "x",
            "body": "y",
            "requestId": 1
        }));
        assert_eq!(failing_fields(&request), vec!["topic"]);

        let request = parse(json!({
            "topic": "a".repeat(901),
            "title": "x",
            "body": "y",
            "requestId": 1
        }));
        assert_eq!(failing_fields(&request), vec!["topic"]);
    }

    #[test]
    fn test_topic_accepts_full_legal_charset() {
        let request = parse(json!({
            "topic": "Maids_2024-block.A~%20",
            "title": "x",
            "body": "y",
            "requestId": 1
        }));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_illegal_types_are_parse_errors() {
        let result: Result<NotificationRequest, _> = serde_json::from_value(json!({
            "topic": "t", "title": "x", "body": "y", "requestId": true
        }));
        assert!(result.is_err());

        let result: Result<NotificationRequest, _> = serde_json::from_value(json!({
            "topic": "t", "title": "x", "body": "y", "requestId": 1, "issue": {"a": 1}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_null_metadata_is_absent() {
        let request = parse(json!({
            "topic": "t", "title": "x", "body": "y", "requestId": 1,
            "flat": null, "actionType": null
        }));
        assert!(request.flat.is_none());
        assert!(request.action_type.is_none());
    }
}
