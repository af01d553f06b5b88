use std::sync::Arc;

use fleet_cache::LiveStateCache;
use fleet_codec::SequenceAllocator;
use fleet_db::{ConnectionRepository, DbPool, UnitOfWork};
use fleet_transport::TransportRegistry;

/// Shared dependencies for every route handler (spec §6's API layer sits
/// thinly atop C6-C9). Cloned into each request via `axum::extract::State`;
/// every field is already cheaply cloneable (`Arc` or a pool handle).
#[derive(Clone)]
pub struct AppState {
    pub uow: UnitOfWork,
    pub cache: Arc<dyn LiveStateCache>,
    pub transport: Arc<TransportRegistry>,
    pub sequence: Arc<SequenceAllocator>,
    pub topic_prefix: String,
    pub default_manufacturer: String,
    pub app_version: String,
}

impl AppState {
    pub fn pool(&self) -> &DbPool {
        self.uow.pool()
    }

    /// `getManufacturer(serial)` (spec §8 testable property 6): returns the
    /// configured default exactly when no `ConnectionState` row exists for
    /// `serial`, or its `manufacturer` field is empty.
    pub async fn resolve_manufacturer(&self, serial: &str) -> String {
        match ConnectionRepository::get(self.pool().pool(), serial).await {
            Ok(state) if !state.manufacturer.is_empty() => state.manufacturer,
            _ => self.default_manufacturer.clone(),
        }
    }
}
