use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use fleet_types::common::ConnectionStateKind;
use fleet_types::message::StateMessage;

use crate::{CacheError, LiveStateCache, STATE_TTL_SECONDS};

fn state_key(serial: &str) -> String {
    format!("robot:state:{serial}")
}

fn connection_key(serial: &str) -> String {
    format!("robot:connection:{serial}")
}

fn connection_timestamp_key(serial: &str) -> String {
    format!("robot:connection:{serial}:timestampUnix")
}

/// Redis-backed implementation. `ConnectionManager` reconnects internally,
/// so callers never need to pool connections themselves — same pattern the
/// teacher uses for its pooled transport/persistence connections.
#[derive(Clone)]
pub struct RedisLiveStateCache {
    conn: ConnectionManager,
}

impl RedisLiveStateCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(RedisLiveStateCache { conn })
    }
}

#[async_trait]
impl LiveStateCache for RedisLiveStateCache {
    async fn put_state(&self, serial: &str, state: &StateMessage) -> Result<(), CacheError> {
        let payload = serde_json::to_string(state)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(state_key(serial), payload, STATE_TTL_SECONDS)
            .await?;
        Ok(())
    }

    async fn get_state_raw(&self, serial: &str) -> Result<Option<StateMessage>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(state_key(serial)).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn put_connection_status(
        &self,
        serial: &str,
        status: ConnectionStateKind,
        timestamp_unix: i64,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // Cache value is the bare status literal (spec §8 S1: `robot:connection:r1`
        // set to `"ONLINE"`) — the timestamp lives at its own key, not folded into
        // a JSON wrapper, so a direct Redis read sees exactly the status string.
        conn.set_ex::<_, _, ()>(connection_key(serial), status.to_string(), STATE_TTL_SECONDS)
            .await?;
        conn.set_ex::<_, _, ()>(
            connection_timestamp_key(serial),
            timestamp_unix,
            STATE_TTL_SECONDS,
        )
        .await?;
        Ok(())
    }

    async fn get_connection_status_raw(
        &self,
        serial: &str,
    ) -> Result<Option<ConnectionStateKind>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(connection_key(serial)).await?;
        match raw {
            Some(raw) => {
                let status = raw
                    .parse::<ConnectionStateKind>()
                    .map_err(CacheError::Decode)?;
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }
}
