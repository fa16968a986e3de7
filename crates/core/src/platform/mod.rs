//! Media platform client abstraction.
//!
//! The bot talks to the platform through a `MediaPlatform` trait so the
//! routine can run against a real gateway or a mock. The shipped
//! implementation is `GatewayClient`, an HTTP client for a self-hosted REST
//! bridge in front of the platform's private API.

mod gateway;
mod types;

pub use gateway::GatewayClient;
pub use types::*;
