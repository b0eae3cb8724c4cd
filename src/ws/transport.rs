//! Transport seam between the reconnect loop and the socket library

use super::types::{CloseReason, Frame, WsError};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// An open, bidirectional WebSocket connection
#[async_trait]
pub trait WsTransport: Send {
    /// Next inbound frame; `None` once the stream has ended
    async fn recv(&mut self) -> Option<Result<Frame, WsError>>;

    /// Send one frame
    async fn send(&mut self, frame: Frame) -> Result<(), WsError>;
}

/// Opens transports for a URL
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Box<dyn WsTransport>, WsError>;
}

/// Connector backed by tokio-tungstenite
#[derive(Debug, Default, Clone, Copy)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn WsTransport>, WsError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        Ok(Box::new(TungsteniteTransport { inner: stream }))
    }
}

struct TungsteniteTransport {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl WsTransport for TungsteniteTransport {
    async fn recv(&mut self) -> Option<Result<Frame, WsError>> {
        loop {
            let frame = match self.inner.next().await? {
                Ok(Message::Text(text)) => Frame::Text(text),
                Ok(Message::Binary(data)) => Frame::Binary(data),
                Ok(Message::Ping(data)) => Frame::Ping(data),
                Ok(Message::Pong(data)) => Frame::Pong(data),
                Ok(Message::Close(close)) => Frame::Close(close.map(|c| CloseReason {
                    code: u16::from(c.code),
                    reason: c.reason.into_owned(),
                })),
                // Raw frames only surface when writing, never on read
                Ok(Message::Frame(_)) => continue,
                Err(e) => return Some(Err(WsError::ConnectionLost(e.to_string()))),
            };
            return Some(Ok(frame));
        }
    }

    async fn send(&mut self, frame: Frame) -> Result<(), WsError> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text),
            Frame::Binary(data) => Message::Binary(data),
            Frame::Ping(data) => Message::Ping(data),
            Frame::Pong(data) => Message::Pong(data),
            Frame::Close(close) => Message::Close(close.map(|c| CloseFrame {
                code: CloseCode::from(c.code),
                reason: c.reason.into(),
            })),
        };

        self.inner
            .send(message)
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }
}
