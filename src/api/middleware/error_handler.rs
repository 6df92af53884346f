//! Error handler for converting AppError to HTTP responses.
//!
//! Every response body is plain text. Client errors explain what was wrong
//! with the request; a delivery failure carries a fixed message and the
//! detail goes to the log only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::AppError;

pub const DELIVERY_FAILED: &str = "Error sending notification";

impl AppError {
    /// Status code and client-facing body for this error
    pub fn status_and_body(&self) -> (StatusCode, String) {
        match self {
            AppError::ValidationErrors { .. } | AppError::BadRequest { .. } => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::Delivery { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, DELIVERY_FAILED.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();

        // Delivery failures are logged with full context by the notification service
        if !matches!(self, AppError::Delivery { .. }) {
            tracing::debug!(error = %self, "Rejected request");
        }

        (status, body).into_response()
    }
}
