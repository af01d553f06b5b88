use std::sync::Arc;
use std::time::Duration;

use fleet_codec::topic::{Topic, TopicKind};
use fleet_codec::{wire, SequenceAllocator};
use fleet_dispatch::CommandSynthesizer;
use fleet_transport::TransportRegistry;
use tracing::warn;

/// Fires the reactive side-effects of spec §4.5 step 6 on their own
/// scheduling unit, never blocking the ingestion path. Failures are logged
/// and otherwise swallowed (spec §7: "reactive tasks swallow their errors
/// after logging").
pub struct ReactiveScheduler {
    sequence: Arc<SequenceAllocator>,
    transport: Arc<TransportRegistry>,
    topic_prefix: String,
    default_manufacturer: String,
}

impl ReactiveScheduler {
    pub fn new(
        sequence: Arc<SequenceAllocator>,
        transport: Arc<TransportRegistry>,
        topic_prefix: impl Into<String>,
        default_manufacturer: impl Into<String>,
    ) -> Self {
        ReactiveScheduler {
            sequence,
            transport,
            topic_prefix: topic_prefix.into(),
            default_manufacturer: default_manufacturer.into(),
        }
    }

    /// `connection` with `state==ONLINE` ⇒ a 1-second-delayed factsheet
    /// request (spec §4.5).
    pub fn schedule_factsheet_request(&self, manufacturer: &str, serial: &str) {
        let sequence = self.sequence.clone();
        let default_manufacturer = self.default_manufacturer.clone();
        let manufacturer = manufacturer.to_string();
        let serial = serial.to_string();
        let scheduler_manufacturer = manufacturer.clone();
        let transport = self.transport.clone();
        let topic_prefix = self.topic_prefix.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let synthesizer = CommandSynthesizer::new(&sequence, default_manufacturer);
            let message = synthesizer.build_factsheet_request(&serial, Some(&manufacturer));
            let payload = match wire::encode(&message) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(%serial, error = %err, "failed to encode reactive factsheetRequest");
                    return;
                }
            };
            let topic = Topic::new(topic_prefix, scheduler_manufacturer, serial, TopicKind::InstantActions).format();
            if let Err(err) = transport.publish(None, &topic, &payload).await {
                warn!(%topic, error = %err, "reactive factsheetRequest publish failed");
            }
        });
    }

    /// `state` with `agvPosition.positionInitialized==false` ⇒ an
    /// `initPosition` instant action at the origin (spec §4.5).
    pub fn schedule_init_position(&self, manufacturer: &str, serial: &str) {
        let sequence = self.sequence.clone();
        let default_manufacturer = self.default_manufacturer.clone();
        let manufacturer = manufacturer.to_string();
        let serial = serial.to_string();
        let scheduler_manufacturer = manufacturer.clone();
        let transport = self.transport.clone();
        let topic_prefix = self.topic_prefix.clone();

        tokio::spawn(async move {
            let synthesizer = CommandSynthesizer::new(&sequence, default_manufacturer);
            let message = synthesizer.build_init_position(&serial, Some(&manufacturer), "", "", 0.0, 0.0, 0.0);
            let payload = match wire::encode(&message) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(%serial, error = %err, "failed to encode reactive initPosition");
                    return;
                }
            };
            let topic = Topic::new(topic_prefix, scheduler_manufacturer, serial, TopicKind::InstantActions).format();
            if let Err(err) = transport.publish(None, &topic, &payload).await {
                warn!(%topic, error = %err, "reactive initPosition publish failed");
            }
        });
    }
}
