//! WebSocket types and configuration

use std::time::Duration;
use thiserror::Error;

/// Close code sent when the client hangs up on purpose
pub const NORMAL_CLOSURE: u16 = 1000;

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Maximum reconnection attempts before giving up (0 = infinite)
    pub max_reconnect_attempts: u32,
    /// Delay before the first reconnection attempt
    pub initial_reconnect_delay: Duration,
    /// Maximum delay between reconnection attempts
    pub max_reconnect_delay: Duration,
    /// Interval for sending ping frames
    pub ping_interval: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: 10,
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
            ping_interval: Duration::from_secs(20),
        }
    }
}

impl WsConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set maximum reconnection attempts
    pub fn max_reconnects(mut self, n: u32) -> Self {
        self.max_reconnect_attempts = n;
        self
    }

    /// Set initial reconnection delay
    pub fn initial_delay(mut self, d: Duration) -> Self {
        self.initial_reconnect_delay = d;
        self
    }

    /// Set maximum reconnection delay
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_reconnect_delay = d;
        self
    }

    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }

    /// Backoff before reconnect number `attempt` (zero-based):
    /// `min(initial * 2^attempt, max)`
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_reconnect_delay
            .saturating_mul(factor)
            .min(self.max_reconnect_delay)
    }
}

/// Close frame details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
}

impl CloseReason {
    pub fn normal(reason: impl Into<String>) -> Self {
        Self {
            code: NORMAL_CLOSURE,
            reason: reason.into(),
        }
    }
}

/// A single frame on the wire, independent of the WebSocket library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close(Option<CloseReason>),
}

/// Events emitted by [`WsClient`](super::WsClient).
///
/// `generation` identifies one connection attempt; it increases by one on
/// every attempt so consumers can discard events from a replaced socket.
#[derive(Debug, Clone)]
pub enum WsEvent {
    /// A connection attempt is starting
    Connecting { generation: u64, attempt: u32 },
    /// Connection established
    Connected { generation: u64 },
    /// Text payload received
    Text { generation: u64, text: String },
    /// Transport-level failure; a `Closed` event always follows
    Error { generation: u64, error: WsError },
    /// Connection closed by the remote side or lost
    Closed {
        generation: u64,
        close: Option<CloseReason>,
    },
    /// A reconnect is scheduled after `delay`
    Reconnecting { attempt: u32, delay: Duration },
    /// Reconnect ceiling reached; the client has stopped
    Failed { attempts: u32 },
}

/// WebSocket errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("No pong received before the next heartbeat")]
    PongTimeout,
}
