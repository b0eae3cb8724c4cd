//! WebSocket client library
//!
//! Provides a reusable WebSocket client with automatic reconnection,
//! ping/pong heartbeat, and exponential backoff.

mod client;
#[cfg(test)]
pub(crate) mod mock;
mod transport;
mod types;

pub use client::WsClient;
pub use transport::{Connector, TungsteniteConnector, WsTransport};
pub use types::{CloseReason, Frame, WsConfig, WsError, WsEvent, NORMAL_CLOSURE};
