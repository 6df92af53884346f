use utoipa::OpenApi;

pub const HEALTH_TAG: &str = "Health";
pub const NOTIFICATION_TAG: &str = "Notifications";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Topic Relay",
        description = "Relays notification requests to topic subscribers through a push backend",
    ),
    tags(
        (name = NOTIFICATION_TAG, description = "Notification relay endpoints"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
