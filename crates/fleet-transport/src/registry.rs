use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, TransportError};
use crate::transport::{Transport, TransportKind};

/// Registry of `{kind → transport}` implementing the selection rules of
/// spec §4.8: explicit request argument, then configured default, then
/// BROKER.
pub struct TransportRegistry {
    transports: HashMap<TransportKind, Arc<dyn Transport>>,
    default_kind: TransportKind,
}

impl TransportRegistry {
    pub fn new(default_kind: TransportKind) -> Self {
        TransportRegistry {
            transports: HashMap::new(),
            default_kind,
        }
    }

    pub fn register(&mut self, kind: TransportKind, transport: Arc<dyn Transport>) {
        self.transports.insert(kind, transport);
    }

    fn resolve(&self, requested: Option<TransportKind>) -> TransportKind {
        requested.unwrap_or(self.default_kind)
    }

    pub async fn publish(&self, requested: Option<TransportKind>, destination: &str, payload: &[u8]) -> Result<()> {
        let kind = self.resolve(requested);
        let transport = self
            .transports
            .get(&kind)
            .ok_or(TransportError::TransportNotRegistered(kind))?;
        transport.publish(destination, payload).await
    }

    pub async fn close_all(&self) -> Result<()> {
        for transport in self.transports.values() {
            transport.close().await?;
        }
        Ok(())
    }

    pub fn is_connected(&self, kind: TransportKind) -> bool {
        self.transports
            .get(&kind)
            .map(|t| t.is_connected())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn publish(&self, _destination: &str, _payload: &[u8]) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn explicit_kind_overrides_default() {
        let mut registry = TransportRegistry::new(TransportKind::Broker);
        let http = Arc::new(CountingTransport { calls: AtomicUsize::new(0) });
        registry.register(TransportKind::Http, http.clone());
        registry.register(TransportKind::Broker, Arc::new(CountingTransport { calls: AtomicUsize::new(0) }));

        registry
            .publish(Some(TransportKind::Http), "robot-1", b"{}")
            .await
            .unwrap();

        assert_eq!(http.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unregistered_kind_is_an_error() {
        let registry = TransportRegistry::new(TransportKind::Broker);
        let result = registry.publish(Some(TransportKind::WebSocket), "robot-1", b"{}").await;
        assert!(matches!(result, Err(TransportError::TransportNotRegistered(TransportKind::WebSocket))));
    }

    #[tokio::test]
    async fn falls_back_to_configured_default_when_no_kind_requested() {
        let mut registry = TransportRegistry::new(TransportKind::Broker);
        let broker = Arc::new(CountingTransport { calls: AtomicUsize::new(0) });
        registry.register(TransportKind::Broker, broker.clone());

        registry.publish(None, "robot-1", b"{}").await.unwrap();

        assert_eq!(broker.calls.load(Ordering::SeqCst), 1);
    }
}
