//! Router configuration for the API.

use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, http::StatusCode, middleware, routing::get};
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{logging_middleware, request_id_middleware};
use crate::state::AppState;

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Creates the application router with all routes and middleware.
///
/// # Routes
/// - `POST /send-notification`
/// - `GET /health`
/// - `GET /api-docs/openapi.json`
///
/// # Middleware Order
/// Last added runs first: request id, then logging, then the timeout.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(handlers::notifications::notification_routes())
        .merge(handlers::health::health_routes())
        .split_for_parts();

    let openapi = Arc::new(openapi);

    router
        .route(
            OPENAPI_PATH,
            get(move || {
                let openapi = openapi.clone();
                async move { Json(openapi.as_ref().clone()) }
            }),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::middleware::REQUEST_ID_HEADER;
    use crate::services::notifications::testing::RecordingProvider;
    use crate::services::notifications::{DeliveryError, MessageEnvelope, PushProvider};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app(provider: &RecordingProvider) -> Router {
        let state = AppState::new(Arc::new(provider.clone()), "9.9.9");
        create_router(state, Duration::from_secs(5))
    }

    fn post_json(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/send-notification")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_valid_request_is_relayed() {
        let provider = RecordingProvider::succeeding();
        let body = json!({
            "topic": "maids",
            "title": "New Request",
            "body": "A new request was placed",
            "requestId": "42",
            "serviceType": "plumbing"
        });

        let (status, text) = send(app(&provider), post_json(body.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "Notification sent!");

        let sent = provider.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].topic, "maids");
        assert_eq!(sent[0].data["requestId"], "42");
        assert_eq!(sent[0].data["serviceType"], "plumbing");
        assert_eq!(sent[0].data["actionType"], "new_request");
        assert_eq!(sent[0].data["issue"], "");
    }

    #[tokio::test]
    async fn test_numeric_request_id_is_relayed_as_text() {
        let provider = RecordingProvider::succeeding();
        let body = json!({
            "topic": "electricians",
            "title": "Reactivated",
            "body": "Request reactivated",
            "requestId": 1001,
            "actionType": "reactivated",
            "flat": 12
        });

        let (status, _) = send(app(&provider), post_json(body.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        let sent = provider.sent();
        assert_eq!(sent[0].data["requestId"], "1001");
        assert_eq!(sent[0].data["actionType"], "reactivated");
        assert_eq!(sent[0].data["flat"], "12");
    }

    #[tokio::test]
    async fn test_exponent_request_id_is_relayed_without_fraction() {
        let provider = RecordingProvider::succeeding();
        let body = r#"{"topic":"maids","title":"t","body":"b","requestId":1.5e3,"time":null,"actionType":""}"#;

        let (status, text) = send(app(&provider), post_json(body.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "Notification sent!");
        let sent = provider.sent();
        assert_eq!(sent[0].data["requestId"], "1500");
        assert_eq!(sent[0].data["time"], "");
        assert_eq!(sent[0].data["actionType"], "new_request");
    }

    #[tokio::test]
    async fn test_missing_body_is_rejected_before_delivery() {
        let provider = RecordingProvider::succeeding();
        let body = json!({"topic": "maids", "title": "New Request", "requestId": "42"});

        let (status, text) = send(app(&provider), post_json(body.to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(text.contains("body is required"), "unexpected body: {text}");
        assert!(provider.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_everything_lists_each_field() {
        let provider = RecordingProvider::succeeding();

        let (status, text) = send(app(&provider), post_json("{}".to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        for field in ["topic", "title", "body", "requestId"] {
            assert!(text.contains(&format!("{field} is required")), "{text}");
        }
        assert!(provider.sent().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let provider = RecordingProvider::succeeding();

        let (status, _) = send(app(&provider), post_json("{\"topic\":".to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(provider.sent().is_empty());
    }

    #[tokio::test]
    async fn test_illegal_request_id_type_is_rejected() {
        let provider = RecordingProvider::succeeding();
        let body = json!({"topic": "t", "title": "x", "body": "y", "requestId": [1, 2]});

        let (status, text) = send(app(&provider), post_json(body.to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(text.contains("expected a string or a number"), "{text}");
        assert!(provider.sent().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_rejected() {
        let provider = RecordingProvider::succeeding();
        let request = Request::builder()
            .method("POST")
            .uri("/send-notification")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))
            .unwrap();

        let (status, _) = send(app(&provider), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(provider.sent().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_is_500_without_retry() {
        let provider = RecordingProvider::failing();
        let body = json!({
            "topic": "maids",
            "title": "New Request",
            "body": "A new request was placed",
            "requestId": "42"
        });

        let (status, text) = send(app(&provider), post_json(body.to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text, "Error sending notification");
        assert_eq!(provider.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_health_reports_version_and_provider() {
        let provider = RecordingProvider::succeeding();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let (status, text) = send(app(&provider), request).await;

        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"status": "healthy", "version": "9.9.9", "provider": "recording"})
        );
    }

    #[tokio::test]
    async fn test_openapi_document_lists_routes() {
        let provider = RecordingProvider::succeeding();
        let request = Request::builder()
            .uri(OPENAPI_PATH)
            .body(Body::empty())
            .unwrap();

        let (status, text) = send(app(&provider), request).await;

        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_str(&text).unwrap();
        assert!(value["paths"]["/send-notification"]["post"].is_object());
        assert!(value["paths"]["/health"]["get"].is_object());
        assert!(value["components"]["schemas"]["NotificationRequest"].is_object());
    }

    #[tokio::test]
    async fn test_every_response_carries_request_id() {
        let provider = RecordingProvider::succeeding();
        let request = Request::builder()
            .method("POST")
            .uri("/send-notification")
            .header(header::CONTENT_TYPE, "application/json")
            .header(REQUEST_ID_HEADER, "trace-me")
            .body(Body::from("{}"))
            .unwrap();

        let response = app(&provider).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "trace-me");
    }

    struct StalledProvider;

    #[async_trait::async_trait]
    impl PushProvider for StalledProvider {
        async fn send(&self, _envelope: &MessageEnvelope) -> Result<String, DeliveryError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_slow_backend_hits_request_timeout() {
        let app = create_router(
            AppState::new(Arc::new(StalledProvider), "9.9.9"),
            Duration::from_millis(50),
        );
        let body = json!({"topic": "maids", "title": "t", "body": "b", "requestId": 1});

        let (status, _) = send(app, post_json(body.to_string())).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let provider = RecordingProvider::succeeding();
        let request = Request::builder()
            .uri("/nope")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(app(&provider), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
