//! Request/response shapes that aren't already part of the wire or
//! persistence model in `fleet_types` (spec §6's HTTP API v1 table).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fleet_types::common::{BlockingType, ConnectionStateKind, ParameterValueType};
use fleet_types::message::{Action, Edge, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct InlineOrderRequest {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
pub struct InlineActionRequest {
    pub actions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteOrderRequest {
    pub template_id: u64,
    pub serial: String,
    #[serde(default)]
    pub parameter_overrides: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransportQuery {
    pub transport: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDispatchedResponse {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateActionParameterTemplateRequest {
    pub key: String,
    pub value: String,
    pub value_type: ParameterValueType,
}

#[derive(Debug, Deserialize)]
pub struct CreateActionTemplateRequest {
    pub action_type: String,
    #[serde(default)]
    pub action_id: Option<String>,
    #[serde(default)]
    pub blocking_type: BlockingType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<CreateActionParameterTemplateRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNodeTemplateRequest {
    pub node_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sequence_id: i64,
    #[serde(default = "default_true")]
    pub released: bool,
    pub pose: NodeTemplatePoseRequest,
    #[serde(default)]
    pub action_template_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct NodeTemplatePoseRequest {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    #[serde(default)]
    pub allowed_deviation_xy: f64,
    #[serde(default)]
    pub allowed_deviation_theta: f64,
    pub map_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateEdgeTemplateRequest {
    pub edge_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sequence_id: i64,
    #[serde(default = "default_true")]
    pub released: bool,
    pub start_node_id: String,
    pub end_node_id: String,
    #[serde(default)]
    pub action_template_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub node_ids: Vec<u64>,
    #[serde(default)]
    pub edge_ids: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: u64,
}

fn default_true() -> bool {
    true
}

/// Derived liveness view combining the last cached `StateMessage` and
/// connection status for one robot (spec §6: "Derived `RobotHealthStatus`
/// from cache"). Not a persisted entity; assembled per-request.
#[derive(Debug, Serialize)]
pub struct RobotHealthStatus {
    pub serial: String,
    pub connection_state: ConnectionStateKind,
    pub driving: bool,
    pub operating_mode: Option<String>,
    pub battery_charge: Option<f64>,
    pub charging: bool,
    pub has_errors: bool,
    pub last_state_at: Option<DateTime<Utc>>,
}
