//! Wire message shapes exchanged with AGVs, bit-exact to spec §4.1.
//!
//! These are the payloads carried on `connection`, `factsheet`, `state`,
//! `order` and `instantActions` topics. Field names are camelCase to match
//! the VDA5050-style protocol; unknown incoming fields are ignored by
//! `serde` (no `deny_unknown_fields`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{BlockingType, ConnectionStateKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionMessage {
    pub header_id: i64,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub connection_state: ConnectionStateKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalParameters {
    pub accel_max: f64,
    pub decel_max: f64,
    pub height_min: Option<f64>,
    pub height_max: Option<f64>,
    pub length: f64,
    pub width: f64,
    pub speed_min: f64,
    pub speed_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSpecification {
    pub agv_class: String,
    pub agv_kinematic: String,
    pub localization_types: Vec<String>,
    pub navigation_types: Vec<String>,
    pub max_load_mass: f64,
    pub series_name: String,
    #[serde(default)]
    pub series_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgvActionParameterWire {
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "isOptional")]
    pub is_optional: bool,
    #[serde(rename = "valueDataType")]
    pub value_data_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgvActionWire {
    #[serde(rename = "actionType")]
    pub action_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "actionScopes")]
    pub action_scopes: Vec<String>,
    #[serde(default, rename = "resultDescription")]
    pub result_description: Option<String>,
    #[serde(default, rename = "actionParameters")]
    pub action_parameters: Vec<AgvActionParameterWire>,
}

/// `protocolFeatures` sub-object: PascalCase keys per spec §4.1 — the one
/// deliberate exception to this message's otherwise-camelCase wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolFeatures {
    #[serde(rename = "AgvActions")]
    pub agv_actions: Vec<AgvActionWire>,
    #[serde(default, rename = "OptionalParameters")]
    pub optional_parameters: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactsheetMessage {
    pub header_id: i64,
    pub manufacturer: String,
    pub serial_number: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub protocol_features: ProtocolFeatures,
    pub physical_parameters: PhysicalParameters,
    pub type_specification: TypeSpecification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgvPosition {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub map_id: String,
    pub position_initialized: bool,
    #[serde(default)]
    pub localization_score: Option<f64>,
    #[serde(default)]
    pub deviation_range: Option<f64>,
    #[serde(default)]
    pub map_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryState {
    pub battery_charge: f64,
    #[serde(default)]
    pub battery_voltage: Option<f64>,
    #[serde(default)]
    pub charging: bool,
    #[serde(default)]
    pub reach: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyState {
    pub e_stop: String,
    pub field_violation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Velocity {
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
    #[serde(default)]
    pub omega: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionState {
    pub action_id: String,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub action_description: Option<String>,
    pub action_status: String,
    #[serde(default)]
    pub result_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeState {
    pub edge_id: String,
    pub sequence_id: i64,
    #[serde(default)]
    pub edge_description: Option<String>,
    pub released: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub error_type: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InformationEntry {
    pub info_type: String,
    #[serde(default)]
    pub info_description: Option<String>,
    #[serde(default)]
    pub info_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMessage {
    pub header_id: i64,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub agv_position: AgvPosition,
    pub battery_state: BatteryState,
    pub safety_state: SafetyState,
    #[serde(default)]
    pub velocity: Velocity,
    pub driving: bool,
    #[serde(default)]
    pub paused: bool,
    pub operating_mode: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub order_update_id: Option<i64>,
    #[serde(default)]
    pub last_node_id: Option<String>,
    #[serde(default)]
    pub last_node_sequence_id: Option<i64>,
    #[serde(default)]
    pub action_states: Vec<ActionState>,
    #[serde(default)]
    pub edge_states: Vec<EdgeState>,
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
    #[serde(default)]
    pub information: Vec<InformationEntry>,
}

impl Default for Velocity {
    fn default() -> Self {
        Velocity {
            vx: 0.0,
            vy: 0.0,
            omega: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    #[serde(rename = "allowedDeviationXY")]
    pub allowed_deviation_xy: f64,
    #[serde(rename = "allowedDeviationTheta")]
    pub allowed_deviation_theta: f64,
    #[serde(rename = "mapId")]
    pub map_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionParameter {
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub action_type: String,
    pub action_id: String,
    #[serde(default)]
    pub blocking_type: BlockingType,
    #[serde(default)]
    pub action_parameters: Vec<ActionParameter>,
    #[serde(default)]
    pub action_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub node_id: String,
    pub sequence_id: i64,
    #[serde(default)]
    pub node_description: Option<String>,
    pub released: bool,
    #[serde(default)]
    pub node_position: Option<NodePosition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub edge_id: String,
    pub sequence_id: i64,
    #[serde(default)]
    pub edge_description: Option<String>,
    pub released: bool,
    pub start_node_id: String,
    pub end_node_id: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMessage {
    pub header_id: i64,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub order_id: String,
    #[serde(default)]
    pub order_update_id: i64,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantActionMessage {
    pub header_id: i64,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub actions: Vec<Action>,
}

/// Opaque acknowledgement payload published on `orderResponse`. The bridge
/// treats this as unstructured per spec §9 (order ack path is ambiguous) and
/// only logs it — see `fleet-ingest`'s handler for the `orderResponse` kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponseMessage {
    #[serde(flatten)]
    pub raw: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_message_decodes_bit_exact_wire_shape() {
        let json = r#"{
            "headerId": 7,
            "timestamp": "2024-01-01T00:00:00Z",
            "version": "2.0",
            "manufacturer": "Acme",
            "serialNumber": "r1",
            "connectionState": "ONLINE"
        }"#;
        let msg: ConnectionMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.header_id, 7);
        assert_eq!(msg.serial_number, "r1");
        assert_eq!(msg.connection_state, ConnectionStateKind::Online);
    }

    #[test]
    fn state_message_tolerates_unknown_fields() {
        let json = r#"{
            "headerId": 1,
            "timestamp": "2024-01-01T00:00:00Z",
            "version": "2.0",
            "manufacturer": "Acme",
            "serialNumber": "r1",
            "agvPosition": {"x":0.0,"y":0.0,"theta":0.0,"mapId":"","positionInitialized":false},
            "batteryState": {"batteryCharge": 0.8},
            "safetyState": {"eStop":"NONE","fieldViolation":false},
            "driving": false,
            "operatingMode": "AUTOMATIC",
            "somethingFromTheFuture": 42
        }"#;
        let msg: StateMessage = serde_json::from_str(json).unwrap();
        assert!(!msg.agv_position.position_initialized);
    }
}
