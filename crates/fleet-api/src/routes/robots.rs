use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use fleet_cache::LiveStateCacheExt;
use fleet_codec::topic::{Topic, TopicKind};
use fleet_codec::wire;
use fleet_db::{ConnectionRepository, FactsheetRepository, Pagination};
use fleet_dispatch::{CommandSynthesizer, OrderExecutor, OrderPlan};
use fleet_transport::TransportKind;
use fleet_types::entity::{ConnectionStateHistory, Factsheet};
use fleet_types::message::StateMessage;

use crate::dto::{
    HistoryQuery, InlineActionRequest, InlineOrderRequest, OrderDispatchedResponse,
    RobotHealthStatus, TransportQuery,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/robots", get(list_online))
        .route("/robots/{serial}/state", get(get_state))
        .route("/robots/{serial}/health", get(get_health))
        .route("/robots/{serial}/capabilities", get(get_capabilities))
        .route("/robots/{serial}/history", get(get_history))
        .route("/robots/{serial}/order", post(dispatch_order))
        .route("/robots/{serial}/order/transport", post(dispatch_order_transport))
        .route("/robots/{serial}/order/http", post(dispatch_order_http))
        .route("/robots/{serial}/order/websocket", post(dispatch_order_websocket))
        .route("/robots/{serial}/action", post(dispatch_action))
}

async fn list_online(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    let rows = ConnectionRepository::list_online(state.pool().pool()).await?;
    Ok(Json(rows.into_iter().map(|row| row.serial).collect()))
}

async fn get_state(
    State(state): State<Arc<AppState>>,
    Path(serial): Path<String>,
) -> Result<Json<StateMessage>, ApiError> {
    state
        .cache
        .get_state(&serial)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no cached state for {serial}")))
}

async fn get_health(
    State(state): State<Arc<AppState>>,
    Path(serial): Path<String>,
) -> Result<Json<RobotHealthStatus>, ApiError> {
    let connection_state = state.cache.get_connection_status(&serial).await;
    let cached_state = state.cache.get_state(&serial).await;

    Ok(Json(RobotHealthStatus {
        serial,
        connection_state,
        driving: cached_state.as_ref().map(|s| s.driving).unwrap_or(false),
        operating_mode: cached_state.as_ref().map(|s| s.operating_mode.clone()),
        battery_charge: cached_state.as_ref().map(|s| s.battery_state.battery_charge),
        charging: cached_state.as_ref().map(|s| s.battery_state.charging).unwrap_or(false),
        has_errors: cached_state.as_ref().map(|s| !s.errors.is_empty()).unwrap_or(false),
        last_state_at: cached_state.as_ref().map(|s| s.timestamp),
    }))
}

async fn get_capabilities(
    State(state): State<Arc<AppState>>,
    Path(serial): Path<String>,
) -> Result<Json<Factsheet>, ApiError> {
    let factsheet = FactsheetRepository::get(state.pool().pool(), &serial).await?;
    Ok(Json(factsheet))
}

async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(serial): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ConnectionStateHistory>>, ApiError> {
    let pagination = Pagination {
        limit: query.limit.unwrap_or(50),
        offset: 0,
    };
    let history = ConnectionRepository::list_history(state.pool().pool(), &serial, pagination).await?;
    Ok(Json(history))
}

async fn dispatch_order(
    State(state): State<Arc<AppState>>,
    Path(serial): Path<String>,
    Json(req): Json<InlineOrderRequest>,
) -> Result<Json<OrderDispatchedResponse>, ApiError> {
    dispatch_inline_order(state, serial, req, None).await
}

async fn dispatch_order_transport(
    State(state): State<Arc<AppState>>,
    Path(serial): Path<String>,
    Query(query): Query<TransportQuery>,
    Json(req): Json<InlineOrderRequest>,
) -> Result<Json<OrderDispatchedResponse>, ApiError> {
    let kind = parse_transport_kind(query.transport.as_deref())?;
    dispatch_inline_order(state, serial, req, kind).await
}

/// Path-suffix transport override (spec §4.8, exercised by scenario S6's
/// `POST /order/http`) — a literal alternative to `?transport=` for callers
/// that prefer a dedicated resource URI per transport.
async fn dispatch_order_http(
    State(state): State<Arc<AppState>>,
    Path(serial): Path<String>,
    Json(req): Json<InlineOrderRequest>,
) -> Result<Json<OrderDispatchedResponse>, ApiError> {
    dispatch_inline_order(state, serial, req, Some(TransportKind::Http)).await
}

async fn dispatch_order_websocket(
    State(state): State<Arc<AppState>>,
    Path(serial): Path<String>,
    Json(req): Json<InlineOrderRequest>,
) -> Result<Json<OrderDispatchedResponse>, ApiError> {
    dispatch_inline_order(state, serial, req, Some(TransportKind::WebSocket)).await
}

async fn dispatch_inline_order(
    state: Arc<AppState>,
    serial: String,
    req: InlineOrderRequest,
    transport_kind: Option<TransportKind>,
) -> Result<Json<OrderDispatchedResponse>, ApiError> {
    let manufacturer = state.resolve_manufacturer(&serial).await;
    let executor = OrderExecutor::new(
        &state.uow,
        &state.transport,
        &state.sequence,
        state.topic_prefix.clone(),
        state.default_manufacturer.clone(),
    );
    let plan = OrderPlan {
        order_template_id: None,
        nodes: req.nodes,
        edges: req.edges,
    };
    let order_id = executor
        .dispatch(&serial, Some(&manufacturer), plan, transport_kind)
        .await?;
    Ok(Json(OrderDispatchedResponse { order_id }))
}

async fn dispatch_action(
    State(state): State<Arc<AppState>>,
    Path(serial): Path<String>,
    Json(req): Json<InlineActionRequest>,
) -> Result<StatusCode, ApiError> {
    let manufacturer = state.resolve_manufacturer(&serial).await;
    let synthesizer = CommandSynthesizer::new(&state.sequence, state.default_manufacturer.clone());
    let message = synthesizer.build_instant_actions(&serial, Some(&manufacturer), req.actions);
    let payload = wire::encode(&message)?;
    let topic = Topic {
        prefix: state.topic_prefix.clone(),
        manufacturer: message.manufacturer.clone(),
        serial: serial.clone(),
        kind: TopicKind::InstantActions,
    }
    .format();

    state.transport.publish(None, &topic, &payload).await?;
    Ok(StatusCode::ACCEPTED)
}

fn parse_transport_kind(requested: Option<&str>) -> Result<Option<TransportKind>, ApiError> {
    match requested {
        None => Ok(None),
        Some("broker") => Ok(Some(TransportKind::Broker)),
        Some("http") => Ok(Some(TransportKind::Http)),
        Some("websocket") => Ok(Some(TransportKind::WebSocket)),
        Some(other) => Err(ApiError::bad_request(format!("unknown transport `{other}`"))),
    }
}
