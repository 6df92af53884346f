//! Clients for services outside the relay.

pub mod client;
pub mod google;
