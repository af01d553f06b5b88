//! Inbound broker subscription and per-message persistence (spec §4.5).
//!
//! [`subscriber`] owns the MQTT-style client subscribed to the four inbound
//! topic patterns; [`handler`] runs the decode-persist-mirror-react
//! algorithm for one message; [`reactive`] fires the delayed
//! factsheet-request and initPosition side effects.

pub mod error;
pub mod handler;
pub mod reactive;
pub mod subscriber;

pub use error::{IngestError, Result};
pub use reactive::ReactiveScheduler;
pub use subscriber::Subscriber;

/// Strips an optional `mqtt://` / `tcp://` scheme and splits `host:port`,
/// defaulting to port 1883 when none is given. Mirrors
/// `fleet_transport::broker`'s parsing so the inbound subscriber connection
/// and the outbound broker transport agree on the same broker address.
pub(crate) fn parse_host_port(broker_url: &str) -> (String, u16) {
    let without_scheme = broker_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(broker_url);
    match without_scheme.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse().unwrap_or(1883);
            (host.to_string(), port)
        }
        None => (without_scheme.to_string(), 1883),
    }
}
