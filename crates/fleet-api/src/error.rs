//! Single boundary layer mapping every inner error type to an HTTP status
//! and a `{code, message}` body (spec §7: "a single boundary layer; lower
//! layers propagate typed errors without string-matching").

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            code: self.code,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<fleet_db::RepoError> for ApiError {
    fn from(err: fleet_db::RepoError) -> Self {
        use fleet_db::RepoError::*;
        match err {
            EntityNotFound(msg) => ApiError::new(StatusCode::NOT_FOUND, "entity_not_found", msg),
            DuplicateEntity(msg) => ApiError::new(StatusCode::CONFLICT, "duplicate_entity", msg),
            ValidationError(msg) => ApiError::new(StatusCode::BAD_REQUEST, "validation_error", msg),
            TransactionError(msg) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "transaction_error", msg)
            }
            RepositoryError(e) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "repository_error", e.to_string())
            }
        }
    }
}

impl From<fleet_codec::DecodeError> for ApiError {
    fn from(err: fleet_codec::DecodeError) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "decode_error", err.to_string())
    }
}

impl From<fleet_codec::TopicError> for ApiError {
    fn from(err: fleet_codec::TopicError) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "topic_error", err.to_string())
    }
}

/// `TransportError` never reaches the API boundary directly: the order
/// executor already folds a publish failure into an `OrderExecution` row
/// with `status=FAILED` (spec §7). This impl exists for the rare direct
/// dispatch path that surfaces it before a row exists.
impl From<fleet_transport::TransportError> for ApiError {
    fn from(err: fleet_transport::TransportError) -> Self {
        ApiError::new(StatusCode::BAD_GATEWAY, "transport_error", err.to_string())
    }
}

impl From<fleet_dispatch::DispatchError> for ApiError {
    fn from(err: fleet_dispatch::DispatchError) -> Self {
        use fleet_dispatch::DispatchError::*;
        match err {
            Repo(e) => e.into(),
            Transport(e) => e.into(),
            Cache(e) => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "cache_error", e.to_string()),
            Codec(e) => e.into(),
            UnknownActionTemplate(id) => {
                ApiError::new(StatusCode::BAD_REQUEST, "unknown_action_template", format!("unknown action template id {id}"))
            }
            OrderAlreadyTerminal(order_id) => ApiError::new(
                StatusCode::CONFLICT,
                "order_already_terminal",
                format!("order {order_id} is already in a terminal state"),
            ),
        }
    }
}
