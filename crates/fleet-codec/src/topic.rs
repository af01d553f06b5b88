//! Topic grammar: `<prefix>/v2/<manufacturer>/<serial>/<kind>` (spec §4.1).
//!
//! `prefix` may itself contain `/` (e.g. a site/floor hierarchy); the last
//! three segments are always `manufacturer/serial/kind` and the segment
//! before those is always the literal `v2`. Subscriptions use single-level
//! wildcards (`+`) for `manufacturer` and `serial`.

use std::fmt;

use crate::error::TopicError;

const PROTOCOL_VERSION: &str = "v2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    Connection,
    Factsheet,
    State,
    OrderResponse,
    Order,
    InstantActions,
}

impl TopicKind {
    pub const ALL: [TopicKind; 6] = [
        TopicKind::Connection,
        TopicKind::Factsheet,
        TopicKind::State,
        TopicKind::OrderResponse,
        TopicKind::Order,
        TopicKind::InstantActions,
    ];

    fn as_segment(self) -> &'static str {
        match self {
            TopicKind::Connection => "connection",
            TopicKind::Factsheet => "factsheet",
            TopicKind::State => "state",
            TopicKind::OrderResponse => "orderResponse",
            TopicKind::Order => "order",
            TopicKind::InstantActions => "instantActions",
        }
    }

    fn parse_segment(segment: &str) -> Option<TopicKind> {
        Some(match segment {
            "connection" => TopicKind::Connection,
            "factsheet" => TopicKind::Factsheet,
            "state" => TopicKind::State,
            "orderResponse" => TopicKind::OrderResponse,
            "order" => TopicKind::Order,
            "instantActions" => TopicKind::InstantActions,
            _ => return None,
        })
    }
}

impl fmt::Display for TopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_segment())
    }
}

/// A parsed or to-be-formatted topic path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub prefix: String,
    pub manufacturer: String,
    pub serial: String,
    pub kind: TopicKind,
}

impl Topic {
    pub fn new(
        prefix: impl Into<String>,
        manufacturer: impl Into<String>,
        serial: impl Into<String>,
        kind: TopicKind,
    ) -> Self {
        Topic {
            prefix: prefix.into(),
            manufacturer: manufacturer.into(),
            serial: serial.into(),
            kind,
        }
    }

    /// Parses a concrete topic path (no wildcards). Fails if the topic has
    /// fewer than 5 `/`-separated parts, the `v2` marker is missing, or the
    /// final segment is not a recognized kind.
    pub fn parse(topic: &str) -> Result<Self, TopicError> {
        let parts: Vec<&str> = topic.split('/').collect();
        if parts.len() < 5 {
            return Err(TopicError::TooFewParts {
                topic: topic.to_string(),
                found: parts.len(),
            });
        }

        let n = parts.len();
        let kind_segment = parts[n - 1];
        let serial = parts[n - 2];
        let manufacturer = parts[n - 3];
        let version = parts[n - 4];
        let prefix = parts[..n - 4].join("/");

        if version != PROTOCOL_VERSION {
            return Err(TopicError::UnknownKind {
                topic: topic.to_string(),
                kind: format!("expected version segment `{PROTOCOL_VERSION}`, found `{version}`"),
            });
        }

        let kind = TopicKind::parse_segment(kind_segment).ok_or_else(|| TopicError::UnknownKind {
            topic: topic.to_string(),
            kind: kind_segment.to_string(),
        })?;

        Ok(Topic {
            prefix,
            manufacturer: manufacturer.to_string(),
            serial: serial.to_string(),
            kind,
        })
    }

    /// Formats the topic back into its wire form. `format(parse(topic)) ==
    /// topic` for every valid topic (spec §8 testable property 5).
    pub fn format(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.prefix, PROTOCOL_VERSION, self.manufacturer, self.serial, self.kind
        )
    }

    /// Subscription pattern for `kind` with single-level wildcards on
    /// manufacturer and serial, e.g. `meili/v2/+/+/connection`.
    pub fn subscription_pattern(prefix: &str, kind: TopicKind) -> String {
        format!("{prefix}/{PROTOCOL_VERSION}/+/+/{kind}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_topic() {
        let topic = Topic::parse("meili/v2/Acme/r1/connection").unwrap();
        assert_eq!(topic.prefix, "meili");
        assert_eq!(topic.manufacturer, "Acme");
        assert_eq!(topic.serial, "r1");
        assert_eq!(topic.kind, TopicKind::Connection);
    }

    #[test]
    fn rejects_too_few_parts() {
        let err = Topic::parse("meili/v2/connection").unwrap_err();
        assert!(matches!(err, TopicError::TooFewParts { .. }));
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = Topic::parse("meili/v2/Acme/r1/unknownKind").unwrap_err();
        assert!(matches!(err, TopicError::UnknownKind { .. }));
    }

    #[test]
    fn multi_segment_prefix_round_trips() {
        let topic = Topic::parse("factory/floor1/v2/Acme/r1/state").unwrap();
        assert_eq!(topic.prefix, "factory/floor1");
        assert_eq!(topic.format(), "factory/floor1/v2/Acme/r1/state");
    }

    proptest::proptest! {
        #[test]
        fn round_trips_for_all_kinds(
            prefix in "[a-z]{1,8}",
            manufacturer in "[A-Za-z]{1,8}",
            serial in "[A-Za-z0-9]{1,8}",
            kind_idx in 0usize..6,
        ) {
            let kind = TopicKind::ALL[kind_idx];
            let topic = Topic::new(prefix, manufacturer, serial, kind);
            let formatted = topic.format();
            let parsed = Topic::parse(&formatted).unwrap();
            prop_assert_eq!(parsed, topic);
        }
    }
}
