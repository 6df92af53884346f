//! Configuration management for topic-relay
//!
//! Layered loading, lowest priority first:
//! 1. `default.toml` - base configuration
//! 2. `{environment}.toml` - environment-specific overrides
//! 3. `local.toml` - local overrides (not committed)
//! 4. `RELAY_*` environment variables

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use loader::ConfigLoader;
pub use settings::{FcmConfig, ServerConfig, Settings};
