//! Notification relay endpoint.

use axum::extract::State;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::NOTIFICATION_TAG;
use crate::api::dto::NotificationRequest;
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::ValidatedJson;

pub const NOTIFICATION_SENT: &str = "Notification sent!";

pub fn notification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(send_notification))
}

/// POST /send-notification - Fan a notification out to a topic
///
/// The request is validated, turned into a push envelope and handed to the
/// push backend exactly once.
#[utoipa::path(
    post,
    path = "/send-notification",
    tag = NOTIFICATION_TAG,
    request_body = NotificationRequest,
    responses(
        (status = 200, description = "Accepted by the push backend", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed JSON or invalid fields", body = String, content_type = "text/plain"),
        (status = 500, description = "The push backend failed", body = String, content_type = "text/plain")
    )
)]
pub async fn send_notification(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<NotificationRequest>,
) -> AppResult<&'static str> {
    state.notifications.send(&request).await?;
    Ok(NOTIFICATION_SENT)
}
