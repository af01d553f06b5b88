//! Persisted row shapes for the connection, capability and execution
//! domains (spec §3). These mirror the SQL schema owned by `fleet-db`;
//! `sqlx::FromRow` derives let repositories map rows directly into them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{ConnectionStateKind, Id, OrderStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionState {
    pub serial: String,
    pub state: ConnectionStateKind,
    pub header_id: i64,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub manufacturer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStateHistory {
    pub id: Id,
    pub serial: String,
    pub state: ConnectionStateKind,
    pub header_id: i64,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub manufacturer: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalParameter {
    pub serial: String,
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
pub struct TypeSpecification {
    pub serial: String,
    pub agv_class: String,
    pub kinematics: String,
    pub localization_types: Value,
    pub navigation_types: Value,
    pub max_load_mass: f64,
    pub series_name: String,
    pub series_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgvAction {
    pub id: Id,
    pub serial: String,
    pub action_type: String,
    pub description: Option<String>,
    pub action_scopes: Value,
    pub result_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgvActionParameter {
    pub id: Id,
    pub agv_action_id: Id,
    pub key: String,
    pub description: Option<String>,
    pub is_optional: bool,
    pub value_data_type: String,
}

/// The full capability record for one robot, assembled by
/// `fleet_db::repositories::FactsheetRepository::get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factsheet {
    pub physical_parameter: PhysicalParameter,
    pub type_specification: TypeSpecification,
    pub actions: Vec<AgvActionWithParameters>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgvActionWithParameters {
    pub action: AgvAction,
    pub parameters: Vec<AgvActionParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderExecution {
    pub order_id: String,
    pub order_template_id: Option<Id>,
    pub serial: String,
    pub order_update_id: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}
