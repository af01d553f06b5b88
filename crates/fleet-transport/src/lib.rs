//! Outbound delivery to AGVs (spec §4.8): a registry dispatching to one of
//! a broker, HTTP, or WebSocket transport, selected per spec's rules.
//!
//! [`BrokerTransport`] wraps an MQTT-style client; [`HttpTransport`] issues
//! `POST`s to a per-robot endpoint; [`WebSocketTransport`] maintains one
//! open connection per endpoint. [`TransportRegistry`] is the seam the rest
//! of the bridge depends on.

pub mod broker;
pub mod error;
pub mod http;
pub mod registry;
pub mod transport;
pub mod websocket;

pub use broker::BrokerTransport;
pub use error::{Result, TransportError};
pub use http::HttpTransport;
pub use registry::TransportRegistry;
pub use transport::{Transport, TransportKind};
pub use websocket::WebSocketTransport;
