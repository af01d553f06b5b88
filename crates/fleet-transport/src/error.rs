use thiserror::Error;

/// Transport-layer error taxonomy (spec §7). Order execution records a
/// `FAILED` status with the underlying message when publish fails.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport not registered for kind {0:?}")]
    TransportNotRegistered(crate::TransportKind),

    #[error("broker error: {0}")]
    Broker(#[from] rumqttc::ClientError),

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket transport error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("publish timed out after {0}ms")]
    Timeout(u64),

    #[error("transport closed")]
    Closed,

    #[error("no endpoint configured for {0:?}")]
    NoEndpointConfigured(crate::TransportKind),
}

pub type Result<T> = std::result::Result<T, TransportError>;
