//! WebSocket client with automatic reconnection

use super::transport::{Connector, TungsteniteConnector, WsTransport};
use super::types::{CloseReason, Frame, WsConfig, WsError, WsEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// How a single connection ended
enum SessionEnd {
    /// Cancelled locally; close frame already sent
    LocalClose,
    /// Event receiver is gone, nobody is listening
    ReceiverDropped,
    /// Remote side sent a close frame
    Remote(Option<CloseReason>),
    /// Transport failure
    Error(WsError),
}

/// Reusable WebSocket client with automatic reconnection and ping/pong handling
pub struct WsClient {
    config: WsConfig,
    connector: Arc<dyn Connector>,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self::with_connector(config, Arc::new(TungsteniteConnector))
    }

    /// Create a client that opens connections through `connector`
    pub fn with_connector(config: WsConfig, connector: Arc<dyn Connector>) -> Self {
        Self { config, connector }
    }

    /// Create a new client with just a URL using default config
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(WsConfig::new(url))
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Connect and return a receiver for connection events along with the
    /// connection task
    ///
    /// The spawned task owns the socket, the heartbeat and the reconnect
    /// timer. Cancelling `shutdown` closes the socket with code 1000 and stops
    /// the task without emitting further events; once the returned handle
    /// resolves the close frame has been written.
    pub fn connect(
        &self,
        shutdown: CancellationToken,
    ) -> (mpsc::Receiver<WsEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(1024);
        let config = self.config.clone();
        let connector = Arc::clone(&self.connector);

        let task = tokio::spawn(async move {
            Self::run_connection_loop(config, connector, tx, shutdown).await;
        });

        (rx, task)
    }

    /// Run the connection loop with automatic reconnection
    async fn run_connection_loop(
        config: WsConfig,
        connector: Arc<dyn Connector>,
        tx: mpsc::Sender<WsEvent>,
        shutdown: CancellationToken,
    ) {
        let mut reconnect_attempts: u32 = 0;
        let mut generation: u64 = 0;

        loop {
            generation += 1;
            let connecting = WsEvent::Connecting {
                generation,
                attempt: reconnect_attempts,
            };
            if tx.send(connecting).await.is_err() {
                return;
            }

            tracing::info!(url = %config.url, generation, "Connecting to WebSocket");

            let connected = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return,
                result = connector.connect(&config.url) => result,
            };

            let end = match connected {
                Ok(transport) => {
                    tracing::info!(generation, "WebSocket connected");
                    reconnect_attempts = 0;
                    if tx.send(WsEvent::Connected { generation }).await.is_err() {
                        return;
                    }
                    Self::stream(&config, transport, generation, &tx, &shutdown).await
                }
                Err(e) => SessionEnd::Error(e),
            };

            match end {
                SessionEnd::LocalClose => {
                    tracing::info!(generation, "WebSocket closed by client");
                    return;
                }
                SessionEnd::ReceiverDropped => {
                    tracing::debug!("Receiver dropped, stopping reconnection");
                    return;
                }
                SessionEnd::Remote(close) => {
                    tracing::info!(
                        generation,
                        code = close.as_ref().map(|c| c.code),
                        reason = close.as_ref().map(|c| c.reason.as_str()).unwrap_or(""),
                        "WebSocket closed by server"
                    );
                    if tx.send(WsEvent::Closed { generation, close }).await.is_err() {
                        return;
                    }
                }
                SessionEnd::Error(error) => {
                    tracing::warn!(generation, error = %error, "WebSocket connection error");
                    if tx.send(WsEvent::Error { generation, error }).await.is_err() {
                        return;
                    }
                    let closed = WsEvent::Closed {
                        generation,
                        close: None,
                    };
                    if tx.send(closed).await.is_err() {
                        return;
                    }
                }
            }

            // Check max reconnects (0 = infinite)
            if config.max_reconnect_attempts > 0
                && reconnect_attempts >= config.max_reconnect_attempts
            {
                tracing::error!(
                    attempts = reconnect_attempts,
                    "Max reconnection attempts reached"
                );
                let _ = tx
                    .send(WsEvent::Failed {
                        attempts: reconnect_attempts,
                    })
                    .await;
                return;
            }

            let delay = config.reconnect_delay(reconnect_attempts);
            reconnect_attempts += 1;

            tracing::warn!(
                attempt = reconnect_attempts,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting..."
            );
            let reconnecting = WsEvent::Reconnecting {
                attempt: reconnect_attempts,
                delay,
            };
            if tx.send(reconnecting).await.is_err() {
                return;
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return,
                _ = sleep(delay) => {}
            }
        }
    }

    /// Pump one open connection until it ends
    async fn stream(
        config: &WsConfig,
        mut transport: Box<dyn WsTransport>,
        generation: u64,
        tx: &mpsc::Sender<WsEvent>,
        shutdown: &CancellationToken,
    ) -> SessionEnd {
        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately
        ping_interval.tick().await;

        let mut waiting_for_pong = false;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    let close = Frame::Close(Some(CloseReason::normal("client unsubscribed")));
                    if let Err(e) = transport.send(close).await {
                        tracing::debug!(error = %e, "Close frame not delivered");
                    }
                    return SessionEnd::LocalClose;
                }

                frame = transport.recv() => {
                    match frame {
                        Some(Ok(Frame::Text(text))) => {
                            if tx.send(WsEvent::Text { generation, text }).await.is_err() {
                                return SessionEnd::ReceiverDropped;
                            }
                        }
                        Some(Ok(Frame::Binary(_))) => {
                            // Market streams are JSON text only
                        }
                        Some(Ok(Frame::Ping(data))) => {
                            if let Err(e) = transport.send(Frame::Pong(data)).await {
                                return SessionEnd::Error(e);
                            }
                        }
                        Some(Ok(Frame::Pong(_))) => {
                            tracing::trace!(generation, "Pong received");
                            waiting_for_pong = false;
                        }
                        Some(Ok(Frame::Close(close))) => {
                            return SessionEnd::Remote(close);
                        }
                        Some(Err(e)) => {
                            return SessionEnd::Error(e);
                        }
                        None => {
                            return SessionEnd::Error(WsError::ConnectionLost(
                                "stream ended unexpectedly".into(),
                            ));
                        }
                    }
                }

                _ = ping_interval.tick() => {
                    if waiting_for_pong {
                        return SessionEnd::Error(WsError::PongTimeout);
                    }
                    if let Err(e) = transport.send(Frame::Ping(Vec::new())).await {
                        return SessionEnd::Error(e);
                    }
                    waiting_for_pong = true;
                }
            }
        }
    }
}
