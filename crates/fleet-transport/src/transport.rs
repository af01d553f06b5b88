use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Result, TransportError};

/// Uniform outbound send surface for broker, HTTP and WebSocket delivery
/// (spec §4.8). `publish`'s `destination` is a topic for the broker
/// transport and an endpoint URL for HTTP/WebSocket.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, destination: &str, payload: &[u8]) -> Result<()>;

    async fn close(&self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Default publish timeout: 30s per spec §4.8. The order executor
    /// layers its own 5s publish-ack wait on top of this where relevant.
    async fn publish_timeout(&self, destination: &str, payload: &[u8], timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.publish(destination, payload))
            .await
            .map_err(|_| TransportError::Timeout(timeout.as_millis() as u64))?
    }
}

/// The three transport kinds the registry can dispatch to (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Broker,
    Http,
    WebSocket,
}

impl TransportKind {
    /// Matches an API path suffix that forces a transport, per spec §4.8:
    /// "endpoints whose path ends in `/http` or `/websocket`".
    pub fn from_path_suffix(path: &str) -> Option<Self> {
        if path.ends_with("/http") {
            Some(TransportKind::Http)
        } else if path.ends_with("/websocket") {
            Some(TransportKind::WebSocket)
        } else {
            None
        }
    }
}
