//! # Live-State Cache (C3)
//!
//! A write-through, TTL'd key/value view of the latest state and
//! connection status per robot (spec §4.3). Reads never touch the
//! persistent store; a miss is the caller's signal to fall back to
//! `fleet-db` where applicable. Operations are independently safe but carry
//! no cross-key atomicity.

mod redis_cache;

use async_trait::async_trait;
use fleet_types::common::ConnectionStateKind;
use fleet_types::message::StateMessage;
use thiserror::Error;

pub use redis_cache::RedisLiveStateCache;

/// Entries live for 24 hours, matching spec §3's cache TTL.
pub const STATE_TTL_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("failed to (de)serialize cached value: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("failed to decode cached value: {0}")]
    Decode(String),
}

/// Low-level cache contract. Implementations must be write-through only —
/// no read-through to persistence.
#[async_trait]
pub trait LiveStateCache: Send + Sync {
    async fn put_state(&self, serial: &str, state: &StateMessage) -> Result<(), CacheError>;

    async fn get_state_raw(&self, serial: &str) -> Result<Option<StateMessage>, CacheError>;

    async fn put_connection_status(
        &self,
        serial: &str,
        status: ConnectionStateKind,
        timestamp_unix: i64,
    ) -> Result<(), CacheError>;

    async fn get_connection_status_raw(
        &self,
        serial: &str,
    ) -> Result<Option<ConnectionStateKind>, CacheError>;
}

/// Convenience wrappers implementing the "errors behave as a miss" policy
/// from spec §7 (`CacheError` is non-fatal and logged; consumers treat it
/// as a cache miss). Blanket-implemented for every [`LiveStateCache`].
#[async_trait]
pub trait LiveStateCacheExt: LiveStateCache {
    async fn get_state(&self, serial: &str) -> Option<StateMessage> {
        match self.get_state_raw(serial).await {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(%serial, error = %err, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Returns the robot's connection status, defaulting to `OFFLINE` on a
    /// miss or a cache error — the explicit default named in spec §4.3.
    async fn get_connection_status(&self, serial: &str) -> ConnectionStateKind {
        match self.get_connection_status_raw(serial).await {
            Ok(Some(status)) => status,
            Ok(None) => ConnectionStateKind::Offline,
            Err(err) => {
                tracing::warn!(%serial, error = %err, "cache read failed, defaulting to OFFLINE");
                ConnectionStateKind::Offline
            }
        }
    }

    async fn is_online(&self, serial: &str) -> bool {
        self.get_connection_status(serial).await == ConnectionStateKind::Online
    }
}

impl<T: LiveStateCache + ?Sized> LiveStateCacheExt for T {}

#[cfg(any(test, feature = "test-util"))]
pub mod fake {
    use super::*;
    use fleet_types::common::ConnectionStateKind;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// In-memory fake used by `fleet-dispatch`/`fleet-ingest` tests so the
    /// cache contract can be exercised without a live Redis instance.
    #[derive(Default)]
    pub struct FakeCache {
        states: Mutex<HashMap<String, StateMessage>>,
        statuses: Mutex<HashMap<String, ConnectionStateKind>>,
    }

    #[async_trait]
    impl LiveStateCache for FakeCache {
        async fn put_state(&self, serial: &str, state: &StateMessage) -> Result<(), CacheError> {
            self.states.lock().insert(serial.to_string(), state.clone());
            Ok(())
        }

        async fn get_state_raw(&self, serial: &str) -> Result<Option<StateMessage>, CacheError> {
            Ok(self.states.lock().get(serial).cloned())
        }

        async fn put_connection_status(
            &self,
            serial: &str,
            status: ConnectionStateKind,
            _timestamp_unix: i64,
        ) -> Result<(), CacheError> {
            self.statuses.lock().insert(serial.to_string(), status);
            Ok(())
        }

        async fn get_connection_status_raw(
            &self,
            serial: &str,
        ) -> Result<Option<ConnectionStateKind>, CacheError> {
            Ok(self.statuses.lock().get(serial).copied())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeCache;
    use super::*;

    #[tokio::test]
    async fn missing_connection_status_defaults_to_offline() {
        let cache = FakeCache::default();
        assert_eq!(cache.get_connection_status("r1").await, ConnectionStateKind::Offline);
        assert!(!cache.is_online("r1").await);
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = FakeCache::default();
        cache
            .put_connection_status("r1", ConnectionStateKind::Online, 0)
            .await
            .unwrap();
        assert!(cache.is_online("r1").await);
    }
}
