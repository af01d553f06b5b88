use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use fleet_db::OrderExecutionRepository;
use fleet_dispatch::OrderExecutor;
use fleet_types::entity::OrderExecution;

use crate::dto::{CancelRequest, ExecuteOrderRequest, OrderDispatchedResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/execute", post(execute_template))
        .route("/orders/{order_id}", get(get_order))
        .route("/orders/{order_id}/cancel", post(cancel_order))
}

async fn execute_template(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteOrderRequest>,
) -> Result<Json<OrderDispatchedResponse>, ApiError> {
    let manufacturer = state.resolve_manufacturer(&req.serial).await;
    let executor = OrderExecutor::new(
        &state.uow,
        &state.transport,
        &state.sequence,
        state.topic_prefix.clone(),
        state.default_manufacturer.clone(),
    );
    let plan = executor
        .plan_from_template(req.template_id, &req.parameter_overrides)
        .await?;
    let order_id = executor
        .dispatch(&req.serial, Some(&manufacturer), plan, None)
        .await?;
    Ok(Json(OrderDispatchedResponse { order_id }))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderExecution>, ApiError> {
    let execution = OrderExecutionRepository::get(state.pool().pool(), &order_id).await?;
    Ok(Json(execution))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<(), ApiError> {
    let execution = OrderExecutionRepository::get(state.pool().pool(), &order_id).await?;
    let manufacturer = state.resolve_manufacturer(&execution.serial).await;
    let executor = OrderExecutor::new(
        &state.uow,
        &state.transport,
        &state.sequence,
        state.topic_prefix.clone(),
        state.default_manufacturer.clone(),
    );
    executor
        .cancel(&order_id, &execution.serial, Some(&manufacturer), req.reason.as_deref())
        .await?;
    Ok(())
}
