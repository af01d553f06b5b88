//! Payload decoding: JSON bytes -> typed wire message (spec §4.1).
//!
//! Unknown fields are ignored by `serde` already (no `deny_unknown_fields`
//! anywhere in `fleet_types::message`); a missing required field surfaces as
//! a `serde_json` "missing field" error, which we fold into
//! [`DecodeError::InvalidJson`] rather than re-deriving per-field checks.

use fleet_types::message::{
    ConnectionMessage, FactsheetMessage, InstantActionMessage, OrderMessage,
    OrderResponseMessage, StateMessage,
};

use crate::error::DecodeError;

pub fn decode_connection(payload: &[u8]) -> Result<ConnectionMessage, DecodeError> {
    Ok(serde_json::from_slice(payload)?)
}

pub fn decode_factsheet(payload: &[u8]) -> Result<FactsheetMessage, DecodeError> {
    Ok(serde_json::from_slice(payload)?)
}

pub fn decode_state(payload: &[u8]) -> Result<StateMessage, DecodeError> {
    Ok(serde_json::from_slice(payload)?)
}

pub fn decode_order(payload: &[u8]) -> Result<OrderMessage, DecodeError> {
    Ok(serde_json::from_slice(payload)?)
}

pub fn decode_instant_action(payload: &[u8]) -> Result<InstantActionMessage, DecodeError> {
    Ok(serde_json::from_slice(payload)?)
}

pub fn decode_order_response(payload: &[u8]) -> Result<OrderResponseMessage, DecodeError> {
    Ok(serde_json::from_slice(payload)?)
}

pub fn encode(message: &impl serde::Serialize) -> Result<Vec<u8>, DecodeError> {
    Ok(serde_json::to_vec(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_connection_fails_on_missing_required_field() {
        let payload = br#"{"headerId":1,"timestamp":"2024-01-01T00:00:00Z","version":"2.0","manufacturer":"Acme"}"#;
        let err = decode_connection(payload).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidJson(_)));
    }

    #[test]
    fn decode_factsheet_fails_on_missing_protocol_features() {
        let payload = br#"{
            "headerId":1,"manufacturer":"Acme","serialNumber":"r1",
            "timestamp":"2024-01-01T00:00:00Z","version":"2.0",
            "physicalParameters":{"accelMax":1.0,"decelMax":1.0,"length":1.0,"width":1.0,"speedMin":0.0,"speedMax":1.0},
            "typeSpecification":{"agvClass":"FORKLIFT","agvKinematic":"DIFF","localizationTypes":[],"navigationTypes":[],"maxLoadMass":100.0,"seriesName":"S1"}
        }"#;
        let err = decode_factsheet(payload).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidJson(_)));
    }

    #[test]
    fn decode_factsheet_accepts_pascal_case_protocol_features() {
        let payload = br#"{
            "headerId":1,"manufacturer":"Acme","serialNumber":"r1",
            "timestamp":"2024-01-01T00:00:00Z","version":"2.0",
            "protocolFeatures":{
                "AgvActions":[{"actionType":"pick","actionScopes":["NODE"]}],
                "OptionalParameters":[]
            },
            "physicalParameters":{"accelMax":1.0,"decelMax":1.0,"length":1.0,"width":1.0,"speedMin":0.0,"speedMax":1.0},
            "typeSpecification":{"agvClass":"FORKLIFT","agvKinematic":"DIFF","localizationTypes":[],"navigationTypes":[],"maxLoadMass":100.0,"seriesName":"S1"}
        }"#;
        let message = decode_factsheet(payload).unwrap();
        assert_eq!(message.protocol_features.agv_actions[0].action_type, "pick");
    }
}
