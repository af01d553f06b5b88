use thiserror::Error;

/// Errors surfaced while splitting/formatting a broker topic (spec §4.1,
/// §7). Malformed topics are dropped by the ingestion handler; never
/// propagated past the per-message boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopicError {
    #[error("topic has {found} parts, need at least 5: {topic:?}")]
    TooFewParts { topic: String, found: usize },

    #[error("unrecognized topic kind {kind:?} in topic {topic:?}")]
    UnknownKind { topic: String, kind: String },
}

/// Errors surfaced while decoding a JSON payload into a typed wire message.
/// Unknown fields are tolerated (forward compat); only a missing required
/// field or malformed JSON produces a `DecodeError`.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("missing required field `{field}` in {kind} message")]
    MissingField { kind: &'static str, field: &'static str },

    #[error("payload was not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
