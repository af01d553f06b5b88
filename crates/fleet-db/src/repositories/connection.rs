use fleet_types::common::ConnectionStateKind;
use fleet_types::entity::{ConnectionState, ConnectionStateHistory};
use fleet_types::message::ConnectionMessage;
use sqlx::{PgPool, Row};
use std::str::FromStr;

use crate::error::{RepoError, Result};
use crate::repositories::Pagination;
use crate::uow::Tx;

/// Repository for the connection domain (spec §3, §4.4).
pub struct ConnectionRepository;

impl ConnectionRepository {
    /// Upserts `ConnectionState` keyed by serial and unconditionally
    /// appends to `ConnectionStateHistory`, inside one transaction.
    pub async fn save(tx: &mut Tx, msg: &ConnectionMessage) -> Result<()> {
        let state = msg.connection_state.to_string();
        sqlx::query(
            r#"
            INSERT INTO connection_states (serial, state, header_id, timestamp, version, manufacturer, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (serial) DO UPDATE SET
                state = excluded.state,
                header_id = excluded.header_id,
                timestamp = excluded.timestamp,
                version = excluded.version,
                manufacturer = excluded.manufacturer,
                updated_at = now()
            "#,
        )
        .bind(&msg.serial_number)
        .bind(&state)
        .bind(msg.header_id)
        .bind(msg.timestamp)
        .bind(&msg.version)
        .bind(&msg.manufacturer)
        .execute(&mut *tx.connection())
        .await?;

        sqlx::query(
            r#"
            INSERT INTO connection_state_history (serial, state, header_id, timestamp, version, manufacturer)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&msg.serial_number)
        .bind(&state)
        .bind(msg.header_id)
        .bind(msg.timestamp)
        .bind(&msg.version)
        .bind(&msg.manufacturer)
        .execute(&mut *tx.connection())
        .await?;

        Ok(())
    }

    fn row_to_state(row: &sqlx::postgres::PgRow) -> Result<ConnectionState> {
        let state_str: String = row.try_get("state")?;
        let state = ConnectionStateKind::from_str(&state_str)
            .map_err(|e| RepoError::ValidationError(e))?;
        Ok(ConnectionState {
            serial: row.try_get("serial")?,
            state,
            header_id: row.try_get("header_id")?,
            timestamp: row.try_get("timestamp")?,
            version: row.try_get("version")?,
            manufacturer: row.try_get("manufacturer")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    pub async fn get(pool: &PgPool, serial: &str) -> Result<ConnectionState> {
        let row = sqlx::query("SELECT * FROM connection_states WHERE serial = $1")
            .bind(serial)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| RepoError::EntityNotFound(format!("connection state for {serial}")))?;
        Self::row_to_state(&row)
    }

    /// "Connected robots": the latest `ConnectionState` per serial whose
    /// state is ONLINE (spec §4.4). Since `connection_states` already holds
    /// exactly one row per serial, this is a plain filter.
    pub async fn list_online(pool: &PgPool) -> Result<Vec<ConnectionState>> {
        let rows = sqlx::query("SELECT * FROM connection_states WHERE state = 'ONLINE' ORDER BY updated_at DESC")
            .fetch_all(pool)
            .await?;
        rows.iter().map(Self::row_to_state).collect()
    }

    pub async fn list_history(
        pool: &PgPool,
        serial: &str,
        pagination: Pagination,
    ) -> Result<Vec<ConnectionStateHistory>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM connection_state_history
            WHERE serial = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(serial)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let state_str: String = row.try_get("state")?;
                let state = ConnectionStateKind::from_str(&state_str).map_err(RepoError::ValidationError)?;
                Ok(ConnectionStateHistory {
                    id: row.try_get::<i64, _>("id")? as u64,
                    serial: row.try_get("serial")?,
                    state,
                    header_id: row.try_get("header_id")?,
                    timestamp: row.try_get("timestamp")?,
                    version: row.try_get("version")?,
                    manufacturer: row.try_get("manufacturer")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    // Repository SQL is exercised against a live Postgres in CI-only
    // integration tests (requires `DATABASE_URL`); see
    // `bin/fleet-bridge/tests/scenarios.rs` for the in-memory-fake-backed
    // behavioral coverage of the ingestion path that consumes this
    // repository.
}
