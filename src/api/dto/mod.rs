//! Data Transfer Objects for API requests and responses.
//!
//! - `notification` - the inbound send request
//! - `health` - the health probe response

mod health;
mod notification;

pub use health::{HealthResponse, HealthStatus};
pub use notification::NotificationRequest;
