use serde::{Deserialize, Serialize};
use std::fmt;

/// Robot connectivity state as reported on the `connection` topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStateKind {
    #[serde(rename = "ONLINE")]
    Online,
    #[serde(rename = "OFFLINE")]
    Offline,
    #[serde(rename = "CONNECTIONBROKEN")]
    ConnectionBroken,
}

impl fmt::Display for ConnectionStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStateKind::Online => "ONLINE",
            ConnectionStateKind::Offline => "OFFLINE",
            ConnectionStateKind::ConnectionBroken => "CONNECTIONBROKEN",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ConnectionStateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(ConnectionStateKind::Online),
            "OFFLINE" => Ok(ConnectionStateKind::Offline),
            "CONNECTIONBROKEN" => Ok(ConnectionStateKind::ConnectionBroken),
            other => Err(format!("unknown connection state: {other}")),
        }
    }
}

/// Lifecycle status of an [`crate::entity::OrderExecution`].
///
/// Transitions are monotonic: `Created -> Sent -> Acknowledged -> Executing
/// -> {Completed|Failed}`, with `Cancelled` reachable from any non-final
/// state. Once a terminal status is reached no further transition is valid —
/// see [`OrderStatus::is_terminal`] and [`OrderStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Created,
    Sent,
    Acknowledged,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Failed | OrderStatus::Cancelled
        )
    }

    /// Whether `self -> next` is an allowed edge in the state machine of
    /// spec §4.9. Terminal states never transition further.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        use OrderStatus::*;
        match (self, next) {
            (Created, Sent | Failed | Cancelled) => true,
            (Sent, Acknowledged | Executing | Failed | Cancelled) => true,
            (Acknowledged, Executing | Failed | Cancelled) => true,
            (Executing, Completed | Failed | Cancelled) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Sent => "SENT",
            OrderStatus::Acknowledged => "ACKNOWLEDGED",
            OrderStatus::Executing => "EXECUTING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(OrderStatus::Created),
            "SENT" => Ok(OrderStatus::Sent),
            "ACKNOWLEDGED" => Ok(OrderStatus::Acknowledged),
            "EXECUTING" => Ok(OrderStatus::Executing),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "FAILED" => Ok(OrderStatus::Failed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Blocking semantics of an instant action or order action, per VDA5050.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockingType {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "SOFT")]
    Soft,
    #[serde(rename = "HARD")]
    Hard,
}

impl Default for BlockingType {
    fn default() -> Self {
        BlockingType::None
    }
}

impl fmt::Display for BlockingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockingType::None => "NONE",
            BlockingType::Soft => "SOFT",
            BlockingType::Hard => "HARD",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for BlockingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(BlockingType::None),
            "SOFT" => Ok(BlockingType::Soft),
            "HARD" => Ok(BlockingType::Hard),
            other => Err(format!("unknown blocking type: {other}")),
        }
    }
}

/// The declared JSON type of a stored action-parameter template value,
/// driving how the template expander decodes the stored string (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterValueType {
    String,
    Number,
    Boolean,
    Object,
}

impl fmt::Display for ParameterValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterValueType::String => "string",
            ParameterValueType::Number => "number",
            ParameterValueType::Boolean => "boolean",
            ParameterValueType::Object => "object",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ParameterValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ParameterValueType::String),
            "number" => Ok(ParameterValueType::Number),
            "boolean" => Ok(ParameterValueType::Boolean),
            "object" => Ok(ParameterValueType::Object),
            other => Err(format!("unknown parameter value type: {other}")),
        }
    }
}

/// Opaque 64-bit identifier used for all template/row primary keys.
pub type Id = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_state_machine_matches_spec() {
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::Sent));
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Created.can_transition_to(OrderStatus::Executing));
        assert!(OrderStatus::Sent.can_transition_to(OrderStatus::Acknowledged));
        assert!(OrderStatus::Sent.can_transition_to(OrderStatus::Executing));
        assert!(OrderStatus::Executing.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Executing));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Sent));
    }

    #[test]
    fn connection_state_round_trips_through_display_and_from_str() {
        for state in [
            ConnectionStateKind::Online,
            ConnectionStateKind::Offline,
            ConnectionStateKind::ConnectionBroken,
        ] {
            let s = state.to_string();
            assert_eq!(s.parse::<ConnectionStateKind>().unwrap(), state);
        }
    }
}
