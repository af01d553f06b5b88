use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::SinkExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::warn;

use crate::error::{Result, TransportError};
use crate::transport::Transport;

type WsSink = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Maintains one open connection per `(kind, endpoint)` with a 30s send
/// timeout (spec §4.8). `kind` here is always "websocket"; the key is the
/// resolved endpoint URL.
pub struct WebSocketTransport {
    endpoint_template: String,
    connections: DashMap<String, Arc<Mutex<WsSink>>>,
    connected: AtomicBool,
}

impl WebSocketTransport {
    pub fn new(endpoint_template: impl Into<String>) -> Self {
        WebSocketTransport {
            endpoint_template: endpoint_template.into(),
            connections: DashMap::new(),
            connected: AtomicBool::new(false),
        }
    }

    fn resolve_endpoint(&self, endpoint: &str) -> String {
        if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
            endpoint.to_string()
        } else {
            self.endpoint_template.replace("{serial}", endpoint)
        }
    }

    async fn connection_for(&self, url: &str) -> Result<Arc<Mutex<WsSink>>> {
        if let Some(existing) = self.connections.get(url) {
            return Ok(existing.clone());
        }
        let (stream, _) = connect_async(url).await?;
        let conn = Arc::new(Mutex::new(stream));
        self.connections.insert(url.to_string(), conn.clone());
        self.connected.store(true, Ordering::SeqCst);
        Ok(conn)
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn publish(&self, endpoint: &str, payload: &[u8]) -> Result<()> {
        let url = self.resolve_endpoint(endpoint);
        let conn = self.connection_for(&url).await?;
        let mut guard = conn.lock().await;
        let send = guard.send(Message::Binary(payload.to_vec()));
        match tokio::time::timeout(Duration::from_secs(30), send).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                drop(guard);
                self.connections.remove(&url);
                Err(TransportError::WebSocket(err))
            }
            Err(_) => Err(TransportError::Timeout(30_000)),
        }
    }

    async fn close(&self) -> Result<()> {
        for entry in self.connections.iter() {
            if let Err(err) = entry.value().lock().await.close(None).await {
                warn!(endpoint = %entry.key(), error = %err, "error closing websocket connection");
            }
        }
        self.connections.clear();
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
