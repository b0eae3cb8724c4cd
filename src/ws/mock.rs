//! Scripted connector for exercising the reconnect loop without a network

use super::transport::{Connector, WsTransport};
use super::types::{Frame, WsError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sender half a test uses to play server frames into a session
pub(crate) type ServerTx = mpsc::UnboundedSender<Result<Frame, WsError>>;

/// Hands out queued sessions; once the queue is empty every connect fails
#[derive(Default)]
pub(crate) struct MockConnector {
    sessions: Mutex<VecDeque<mpsc::UnboundedReceiver<Result<Frame, WsError>>>>,
    connects: AtomicUsize,
    sent: Arc<Mutex<Vec<Frame>>>,
}

impl MockConnector {
    /// Connector that refuses every connection
    pub(crate) fn failing() -> Self {
        Self::default()
    }

    /// Queue one session that will accept the next connect
    pub(crate) fn push_session(&self) -> ServerTx {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions.lock().push_back(rx);
        tx
    }

    pub(crate) fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Every frame the client sent, across all sessions
    pub(crate) fn sent_frames(&self) -> Vec<Frame> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn WsTransport>, WsError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        match self.sessions.lock().pop_front() {
            Some(rx) => Ok(Box::new(MockTransport {
                rx,
                sent: Arc::clone(&self.sent),
            })),
            None => Err(WsError::ConnectionFailed("connection refused".into())),
        }
    }
}

struct MockTransport {
    rx: mpsc::UnboundedReceiver<Result<Frame, WsError>>,
    sent: Arc<Mutex<Vec<Frame>>>,
}

#[async_trait]
impl WsTransport for MockTransport {
    async fn recv(&mut self) -> Option<Result<Frame, WsError>> {
        self.rx.recv().await
    }

    async fn send(&mut self, frame: Frame) -> Result<(), WsError> {
        self.sent.lock().push(frame);
        Ok(())
    }
}
