//! The order template model (spec §3 "Template domain", §4.7).
//!
//! `NodeTemplate` and `EdgeTemplate` form a directed graph referenced by
//! string ids (`start_node_id`/`end_node_id`); association to an
//! `OrderTemplate` is many-to-many via explicit join rows. This module
//! models that with plain ids, never intrusive references — per the
//! REDESIGN note in spec §9, the graph is resolved by id lookup at
//! expansion time, not walked as an object graph.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{BlockingType, Id, ParameterValueType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionTemplate {
    pub id: Id,
    pub action_type: String,
    pub action_id: Option<String>,
    pub blocking_type: BlockingType,
    pub action_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionParameterTemplate {
    pub id: Id,
    pub action_template_id: Id,
    pub key: String,
    /// Serialized JSON scalar/structure; decode with `value_type`.
    pub value: String,
    pub value_type: ParameterValueType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTemplatePose {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub allowed_deviation_xy: f64,
    pub allowed_deviation_theta: f64,
    pub map_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTemplate {
    pub id: Id,
    pub node_id: String,
    pub name: String,
    pub description: Option<String>,
    pub sequence_id: i64,
    pub released: bool,
    pub pose: NodeTemplatePose,
    pub action_template_ids: Vec<Id>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeTemplate {
    pub id: Id,
    pub edge_id: String,
    pub name: String,
    pub description: Option<String>,
    pub sequence_id: i64,
    pub released: bool,
    pub start_node_id: String,
    pub end_node_id: String,
    pub action_template_ids: Vec<Id>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTemplate {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
}

/// An `OrderTemplate` fully resolved with its member nodes and edges,
/// as loaded by `fleet_db::repositories::TemplateRepository::load_order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedOrderTemplate {
    pub order_template: OrderTemplate,
    pub nodes: Vec<ResolvedNodeTemplate>,
    pub edges: Vec<ResolvedEdgeTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedNodeTemplate {
    pub node: NodeTemplate,
    pub actions: Vec<ResolvedActionTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedEdgeTemplate {
    pub edge: EdgeTemplate,
    pub actions: Vec<ResolvedActionTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedActionTemplate {
    pub template: ActionTemplate,
    pub parameters: Vec<ActionParameterTemplate>,
}

/// A parameter value after type coercion (spec §4.7 step 2): decoded to its
/// dynamic JSON form, or left as the verbatim string for `String`/unknown
/// types unless a JSON parse of it would succeed for a non-string type.
pub fn coerce_parameter_value(raw: &str, value_type: ParameterValueType) -> Value {
    match value_type {
        ParameterValueType::Number | ParameterValueType::Boolean | ParameterValueType::Object => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
        ParameterValueType::String => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) if !parsed.is_string() => parsed,
            _ => Value::String(raw.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_number_value_type() {
        let v = coerce_parameter_value("2.5", ParameterValueType::Number);
        assert_eq!(v, Value::from(2.5));
    }

    #[test]
    fn coerces_boolean_value_type() {
        let v = coerce_parameter_value("true", ParameterValueType::Boolean);
        assert_eq!(v, Value::from(true));
    }

    #[test]
    fn string_value_type_uses_verbatim_string_unless_parseable_as_non_string() {
        assert_eq!(
            coerce_parameter_value("hello", ParameterValueType::String),
            Value::String("hello".to_string())
        );
        // a numeric literal stored under a `string` valueType still prefers
        // the parsed value, per spec §4.7 step 2's explicit carve-out.
        assert_eq!(
            coerce_parameter_value("42", ParameterValueType::String),
            Value::from(42)
        );
    }

    #[test]
    fn malformed_json_falls_back_to_verbatim_string() {
        let v = coerce_parameter_value("{not json", ParameterValueType::Object);
        assert_eq!(v, Value::String("{not json".to_string()));
    }
}
