//! Service layer for business logic operations.
//!
//! Services sit between handlers and external backends.

pub mod notifications;

pub use notifications::NotificationService;
