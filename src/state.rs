//! Application state for Axum web framework.

use std::sync::Arc;

use crate::services::NotificationService;
use crate::services::notifications::PushProvider;

/// Shared state handed to every handler.
///
/// Cloning is cheap: the provider sits behind an `Arc` and is never mutated
/// after startup.
#[derive(Clone)]
pub struct AppState {
    pub notifications: NotificationService,
    /// Reported by the health probe
    pub version: String,
}

impl AppState {
    pub fn new(provider: Arc<dyn PushProvider>, version: impl Into<String>) -> Self {
        Self {
            notifications: NotificationService::new(provider),
            version: version.into(),
        }
    }
}
