use std::collections::HashMap;

use fleet_codec::SequenceAllocator;
use fleet_types::message::{Action, ActionParameter, Edge, Node, NodePosition};
use fleet_types::template::{coerce_parameter_value, ResolvedActionTemplate, ResolvedOrderTemplate};
use serde_json::Value;

/// Resolves an `OrderTemplate` into a concrete node/edge/action graph
/// (spec §4.7). Loading the template (step 1) is `fleet-db`'s job; this
/// module does steps 2-4: coerce parameter values, apply overrides, and
/// assemble the `Node`/`Edge` lists the command synthesizer turns into a
/// wire `OrderMessage`. Every expanded action gets a fresh `actionId` from
/// `sequence`, per spec §4.6 — a template's stored `actionId` (if any) is
/// descriptive only, never reused on the wire.
///
/// Overrides apply globally by parameter key across the whole order —
/// there is no per-action namespacing in the template model (open
/// question in spec §9, resolved this way; see DESIGN.md).
pub fn expand_actions(
    templates: &[ResolvedActionTemplate],
    overrides: &HashMap<String, Value>,
    sequence: &SequenceAllocator,
) -> Vec<Action> {
    templates
        .iter()
        .map(|resolved| {
            let action_parameters = resolved
                .parameters
                .iter()
                .map(|param| {
                    let value = overrides
                        .get(&param.key)
                        .cloned()
                        .unwrap_or_else(|| coerce_parameter_value(&param.value, param.value_type));
                    ActionParameter {
                        key: param.key.clone(),
                        value,
                    }
                })
                .collect();

            Action {
                action_type: resolved.template.action_type.clone(),
                action_id: sequence.next_action_id(),
                blocking_type: resolved.template.blocking_type,
                action_parameters,
                action_description: resolved.template.action_description.clone(),
            }
        })
        .collect()
}

pub fn expand_order(
    resolved: &ResolvedOrderTemplate,
    overrides: &HashMap<String, Value>,
    sequence: &SequenceAllocator,
) -> (Vec<Node>, Vec<Edge>) {
    let nodes = resolved
        .nodes
        .iter()
        .map(|rn| Node {
            node_id: rn.node.node_id.clone(),
            sequence_id: rn.node.sequence_id,
            node_description: rn.node.description.clone(),
            released: rn.node.released,
            node_position: Some(NodePosition {
                x: rn.node.pose.x,
                y: rn.node.pose.y,
                theta: rn.node.pose.theta,
                allowed_deviation_xy: rn.node.pose.allowed_deviation_xy,
                allowed_deviation_theta: rn.node.pose.allowed_deviation_theta,
                map_id: rn.node.pose.map_id.clone(),
            }),
            actions: expand_actions(&rn.actions, overrides, sequence),
        })
        .collect();

    let edges = resolved
        .edges
        .iter()
        .map(|re| Edge {
            edge_id: re.edge.edge_id.clone(),
            sequence_id: re.edge.sequence_id,
            edge_description: re.edge.description.clone(),
            released: re.edge.released,
            start_node_id: re.edge.start_node_id.clone(),
            end_node_id: re.edge.end_node_id.clone(),
            actions: expand_actions(&re.actions, overrides, sequence),
        })
        .collect();

    (nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_types::common::{BlockingType, Id, ParameterValueType};
    use fleet_types::template::{ActionParameterTemplate, ActionTemplate};

    fn action_template(id: Id, key: &str, value: &str, value_type: ParameterValueType) -> ResolvedActionTemplate {
        ResolvedActionTemplate {
            template: ActionTemplate {
                id,
                action_type: "pick".to_string(),
                action_id: None,
                blocking_type: BlockingType::Hard,
                action_description: None,
            },
            parameters: vec![ActionParameterTemplate {
                id: 1,
                action_template_id: id,
                key: key.to_string(),
                value: value.to_string(),
                value_type,
            }],
        }
    }

    #[test]
    fn override_replaces_parameter_value_globally_by_key() {
        let templates = vec![action_template(1, "height", "1.5", ParameterValueType::Number)];
        let mut overrides = HashMap::new();
        overrides.insert("height".to_string(), Value::from(9.9));
        let sequence = SequenceAllocator::new();

        let actions = expand_actions(&templates, &overrides, &sequence);

        assert_eq!(actions[0].action_parameters[0].value, Value::from(9.9));
    }

    #[test]
    fn missing_override_falls_back_to_coerced_template_value() {
        let templates = vec![action_template(1, "height", "1.5", ParameterValueType::Number)];
        let sequence = SequenceAllocator::new();
        let actions = expand_actions(&templates, &HashMap::new(), &sequence);
        assert_eq!(actions[0].action_parameters[0].value, Value::from(1.5));
    }
}
