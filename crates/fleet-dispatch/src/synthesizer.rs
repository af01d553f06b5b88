use chrono::Utc;
use fleet_codec::SequenceAllocator;
use fleet_types::common::BlockingType;
use fleet_types::message::{Action, ActionParameter, Edge, InstantActionMessage, Node, OrderMessage};
use serde_json::json;

const PROTOCOL_VERSION: &str = "2.0.0";

/// Produces the byte-level content of outbound messages (spec §4.6). Every
/// message carries a fresh `headerId` allocated per-serial; every action
/// carries a fresh `actionId`.
pub struct CommandSynthesizer<'a> {
    sequence: &'a SequenceAllocator,
    default_manufacturer: String,
}

impl<'a> CommandSynthesizer<'a> {
    pub fn new(sequence: &'a SequenceAllocator, default_manufacturer: impl Into<String>) -> Self {
        CommandSynthesizer {
            sequence,
            default_manufacturer: default_manufacturer.into(),
        }
    }

    fn manufacturer(&self, known: Option<&str>) -> String {
        known
            .map(|m| m.to_string())
            .unwrap_or_else(|| self.default_manufacturer.clone())
    }

    pub fn build_order(
        &self,
        serial: &str,
        known_manufacturer: Option<&str>,
        order_id: String,
        order_update_id: i64,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> OrderMessage {
        OrderMessage {
            header_id: self.sequence.next_header_id(serial),
            timestamp: Utc::now(),
            version: PROTOCOL_VERSION.to_string(),
            manufacturer: self.manufacturer(known_manufacturer),
            serial_number: serial.to_string(),
            order_id,
            order_update_id,
            nodes,
            edges,
        }
    }

    pub fn build_instant_actions(
        &self,
        serial: &str,
        known_manufacturer: Option<&str>,
        actions: Vec<Action>,
    ) -> InstantActionMessage {
        InstantActionMessage {
            header_id: self.sequence.next_header_id(serial),
            timestamp: Utc::now(),
            version: PROTOCOL_VERSION.to_string(),
            manufacturer: self.manufacturer(known_manufacturer),
            serial_number: serial.to_string(),
            actions,
        }
    }

    /// `actionType="factsheetRequest"`, empty parameters (spec §4.6).
    pub fn build_factsheet_request(&self, serial: &str, known_manufacturer: Option<&str>) -> InstantActionMessage {
        let action = Action {
            action_type: "factsheetRequest".to_string(),
            action_id: self.sequence.next_action_id(),
            blocking_type: BlockingType::None,
            action_parameters: Vec::new(),
            action_description: None,
        };
        self.build_instant_actions(serial, known_manufacturer, vec![action])
    }

    /// `actionType="initPosition"` with one `pose` parameter
    /// `{lastNodeId, mapId, theta, x, y}` (spec §4.6). The ingestion
    /// reactive path always calls this with the origin pose and an empty
    /// map id, per spec §4.5.
    pub fn build_init_position(
        &self,
        serial: &str,
        known_manufacturer: Option<&str>,
        last_node_id: &str,
        map_id: &str,
        x: f64,
        y: f64,
        theta: f64,
    ) -> InstantActionMessage {
        let pose = json!({
            "lastNodeId": last_node_id,
            "mapId": map_id,
            "theta": theta,
            "x": x,
            "y": y,
        });
        let action = Action {
            action_type: "initPosition".to_string(),
            action_id: self.sequence.next_action_id(),
            blocking_type: BlockingType::Hard,
            action_parameters: vec![ActionParameter {
                key: "pose".to_string(),
                value: pose,
            }],
            action_description: None,
        };
        self.build_instant_actions(serial, known_manufacturer, vec![action])
    }

    /// `actionType="cancelOrder"`, empty parameters (spec §4.9 step 5).
    pub fn build_cancel_order(&self, serial: &str, known_manufacturer: Option<&str>) -> InstantActionMessage {
        let action = Action {
            action_type: "cancelOrder".to_string(),
            action_id: self.sequence.next_action_id(),
            blocking_type: BlockingType::Hard,
            action_parameters: Vec::new(),
            action_description: None,
        };
        self.build_instant_actions(serial, known_manufacturer, vec![action])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factsheet_request_has_no_parameters() {
        let seq = SequenceAllocator::new();
        let synth = CommandSynthesizer::new(&seq, "Roboligent");
        let msg = synth.build_factsheet_request("r1", None);
        assert_eq!(msg.actions.len(), 1);
        assert_eq!(msg.actions[0].action_type, "factsheetRequest");
        assert!(msg.actions[0].action_parameters.is_empty());
        assert_eq!(msg.manufacturer, "Roboligent");
    }

    #[test]
    fn init_position_carries_pose_parameter() {
        let seq = SequenceAllocator::new();
        let synth = CommandSynthesizer::new(&seq, "Roboligent");
        let msg = synth.build_init_position("r1", Some("Acme"), "", "", 0.0, 0.0, 0.0);
        assert_eq!(msg.manufacturer, "Acme");
        assert_eq!(msg.actions[0].action_parameters[0].key, "pose");
    }

    #[test]
    fn header_ids_increase_across_successive_builds() {
        let seq = SequenceAllocator::new();
        let synth = CommandSynthesizer::new(&seq, "Roboligent");
        let first = synth.build_factsheet_request("r1", None).header_id;
        let second = synth.build_factsheet_request("r1", None).header_id;
        assert!(second > first);
    }
}
