use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use fleet_db::TemplateRepository;
use fleet_types::template::{
    EdgeTemplate, NodeTemplate, NodeTemplatePose, OrderTemplate, ResolvedActionTemplate,
    ResolvedOrderTemplate,
};

use crate::dto::{
    CreateActionTemplateRequest, CreateEdgeTemplateRequest, CreateNodeTemplateRequest,
    CreateOrderTemplateRequest, CreatedResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/actions", get(list_actions).post(create_action))
        .route("/actions/{id}", get(get_action).delete(delete_action))
        .route("/nodes", get(list_nodes).post(create_node))
        .route("/nodes/{id}", get(get_node).delete(delete_node))
        .route("/edges", get(list_edges).post(create_edge))
        .route("/edges/{id}", get(get_edge).delete(delete_edge))
        .route("/order-templates", get(list_order_templates).post(create_order_template))
        .route(
            "/order-templates/{id}",
            get(get_order_template).delete(delete_order_template),
        )
}

async fn list_actions(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ResolvedActionTemplate>>, ApiError> {
    Ok(Json(TemplateRepository::list_action_templates(state.pool().pool()).await?))
}

async fn get_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ResolvedActionTemplate>, ApiError> {
    Ok(Json(TemplateRepository::get_action_template(state.pool().pool(), id).await?))
}

async fn create_action(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateActionTemplateRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let mut tx = state.uow.begin().await?;
    let id = TemplateRepository::create_action_template(
        &mut tx,
        &req.action_type,
        req.action_id.as_deref(),
        req.blocking_type,
        req.description.as_deref(),
    )
    .await?;
    for param in &req.parameters {
        TemplateRepository::add_action_parameter(&mut tx, id, &param.key, &param.value, param.value_type).await?;
    }
    tx.commit().await?;
    Ok(Json(CreatedResponse { id }))
}

async fn delete_action(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> Result<StatusCode, ApiError> {
    let mut tx = state.uow.begin().await?;
    TemplateRepository::delete_action_template(&mut tx, id).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_nodes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<NodeTemplate>>, ApiError> {
    Ok(Json(TemplateRepository::list_node_templates(state.pool().pool()).await?))
}

async fn get_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<NodeTemplate>, ApiError> {
    Ok(Json(TemplateRepository::get_node_template(state.pool().pool(), id).await?))
}

async fn create_node(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNodeTemplateRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let node = NodeTemplate {
        id: 0,
        node_id: req.node_id,
        name: req.name,
        description: req.description,
        sequence_id: req.sequence_id,
        released: req.released,
        pose: NodeTemplatePose {
            x: req.pose.x,
            y: req.pose.y,
            theta: req.pose.theta,
            allowed_deviation_xy: req.pose.allowed_deviation_xy,
            allowed_deviation_theta: req.pose.allowed_deviation_theta,
            map_id: req.pose.map_id,
        },
        action_template_ids: req.action_template_ids,
    };
    let mut tx = state.uow.begin().await?;
    let id = TemplateRepository::create_node_template(&mut tx, &node).await?;
    tx.commit().await?;
    Ok(Json(CreatedResponse { id }))
}

async fn delete_node(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> Result<StatusCode, ApiError> {
    let mut tx = state.uow.begin().await?;
    TemplateRepository::delete_node_template(&mut tx, id).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_edges(State(state): State<Arc<AppState>>) -> Result<Json<Vec<EdgeTemplate>>, ApiError> {
    Ok(Json(TemplateRepository::list_edge_templates(state.pool().pool()).await?))
}

async fn get_edge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<EdgeTemplate>, ApiError> {
    Ok(Json(TemplateRepository::get_edge_template(state.pool().pool(), id).await?))
}

async fn create_edge(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEdgeTemplateRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let edge = EdgeTemplate {
        id: 0,
        edge_id: req.edge_id,
        name: req.name,
        description: req.description,
        sequence_id: req.sequence_id,
        released: req.released,
        start_node_id: req.start_node_id,
        end_node_id: req.end_node_id,
        action_template_ids: req.action_template_ids,
    };
    let mut tx = state.uow.begin().await?;
    let id = TemplateRepository::create_edge_template(&mut tx, &edge).await?;
    tx.commit().await?;
    Ok(Json(CreatedResponse { id }))
}

async fn delete_edge(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> Result<StatusCode, ApiError> {
    let mut tx = state.uow.begin().await?;
    TemplateRepository::delete_edge_template(&mut tx, id).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_order_templates(State(state): State<Arc<AppState>>) -> Result<Json<Vec<OrderTemplate>>, ApiError> {
    Ok(Json(TemplateRepository::list_order_templates(state.pool().pool()).await?))
}

async fn get_order_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ResolvedOrderTemplate>, ApiError> {
    Ok(Json(TemplateRepository::load_order(state.pool().pool(), id).await?))
}

async fn create_order_template(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderTemplateRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let mut tx = state.uow.begin().await?;
    let id = TemplateRepository::create_order_template(
        &mut tx,
        &req.name,
        req.description.as_deref(),
        &req.node_ids,
        &req.edge_ids,
    )
    .await?;
    tx.commit().await?;
    Ok(Json(CreatedResponse { id }))
}

async fn delete_order_template(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> Result<StatusCode, ApiError> {
    let mut tx = state.uow.begin().await?;
    TemplateRepository::delete_order_template(&mut tx, id).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
