use chrono::Utc;
use fleet_types::common::OrderStatus;
use fleet_types::entity::OrderExecution;
use sqlx::{PgPool, Row};
use std::str::FromStr;

use crate::error::{RepoError, Result};
use crate::repositories::Pagination;
use crate::uow::Tx;

/// Repository for order lifecycle tracking (spec §3, §4.4, §4.9).
pub struct OrderExecutionRepository;

impl OrderExecutionRepository {
    pub async fn create(
        tx: &mut Tx,
        order_id: &str,
        order_template_id: Option<u64>,
        serial: &str,
        order_update_id: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_executions (order_id, order_template_id, serial, order_update_id, status)
            VALUES ($1, $2, $3, $4, 'CREATED')
            "#,
        )
        .bind(order_id)
        .bind(order_template_id.map(|id| id as i64))
        .bind(serial)
        .bind(order_update_id)
        .execute(&mut *tx.connection())
        .await?;
        Ok(())
    }

    /// Applies a status transition, enforcing the state machine in
    /// [`OrderStatus::can_transition_to`]. Sets `started_at` on entering
    /// EXECUTING and `completed_at` on entering any terminal status.
    pub async fn update_status(
        tx: &mut Tx,
        order_id: &str,
        next: OrderStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let row = sqlx::query("SELECT status FROM order_executions WHERE order_id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut *tx.connection())
            .await?
            .ok_or_else(|| RepoError::EntityNotFound(format!("order execution {order_id}")))?;
        let current_str: String = row.try_get("status")?;
        let current = OrderStatus::from_str(&current_str)
            .map_err(RepoError::ValidationError)?;

        if !current.can_transition_to(next) {
            return Err(RepoError::ValidationError(format!(
                "illegal order status transition for {order_id}: {current} -> {next}"
            )));
        }

        let now = Utc::now();
        let started_at = matches!(next, OrderStatus::Executing).then_some(now);
        let completed_at = next.is_terminal().then_some(now);

        sqlx::query(
            r#"
            UPDATE order_executions SET
                status = $1,
                error_message = COALESCE($2, error_message),
                started_at = COALESCE(started_at, $3),
                completed_at = COALESCE($4, completed_at),
                updated_at = now()
            WHERE order_id = $5
            "#,
        )
        .bind(next.to_string())
        .bind(error_message)
        .bind(started_at)
        .bind(completed_at)
        .bind(order_id)
        .execute(&mut *tx.connection())
        .await?;

        Ok(())
    }

    fn row_to_execution(row: &sqlx::postgres::PgRow) -> Result<OrderExecution> {
        let status_str: String = row.try_get("status")?;
        let status = OrderStatus::from_str(&status_str).map_err(RepoError::ValidationError)?;
        Ok(OrderExecution {
            order_id: row.try_get("order_id")?,
            order_template_id: row
                .try_get::<Option<i64>, _>("order_template_id")?
                .map(|v| v as u64),
            serial: row.try_get("serial")?,
            order_update_id: row.try_get("order_update_id")?,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            started_at: row.try_get("started_at")?,
            completed_at: row.try_get("completed_at")?,
            error_message: row.try_get("error_message")?,
        })
    }

    pub async fn get(pool: &PgPool, order_id: &str) -> Result<OrderExecution> {
        let row = sqlx::query("SELECT * FROM order_executions WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| RepoError::EntityNotFound(format!("order execution {order_id}")))?;
        Self::row_to_execution(&row)
    }

    pub async fn list(
        pool: &PgPool,
        serial: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<OrderExecution>> {
        let rows = match serial {
            Some(serial) => {
                sqlx::query(
                    r#"
                    SELECT * FROM order_executions
                    WHERE serial = $1
                    ORDER BY created_at DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(serial)
                .bind(pagination.limit)
                .bind(pagination.offset)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT * FROM order_executions
                    ORDER BY created_at DESC
                    LIMIT $1 OFFSET $2
                    "#,
                )
                .bind(pagination.limit)
                .bind(pagination.offset)
                .fetch_all(pool)
                .await?
            }
        };
        rows.iter().map(Self::row_to_execution).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_transition_is_rejected_by_state_machine() {
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Executing));
        assert!(OrderStatus::Sent.can_transition_to(OrderStatus::Acknowledged));
    }
}
