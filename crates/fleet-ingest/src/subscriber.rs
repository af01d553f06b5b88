use std::sync::Arc;
use std::time::Duration;

use fleet_cache::LiveStateCache;
use fleet_codec::topic::{Topic, TopicKind};
use fleet_db::UnitOfWork;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::handler::handle_message;
use crate::reactive::ReactiveScheduler;

const SUBSCRIBED_KINDS: [TopicKind; 4] = [
    TopicKind::Connection,
    TopicKind::Factsheet,
    TopicKind::State,
    TopicKind::OrderResponse,
];

/// Owns the inbound broker connection and subscribes to the four topic
/// patterns of spec §4.5. Each inbound publish is decoded and persisted on
/// its own task so a slow handler never backs up the eventloop.
pub struct Subscriber {
    client: AsyncClient,
}

impl Subscriber {
    pub async fn connect(
        broker_url: &str,
        client_id: &str,
        username: Option<&str>,
        password: Option<&str>,
        topic_prefix: &str,
        uow: UnitOfWork,
        cache: Arc<dyn LiveStateCache>,
        reactive: Arc<ReactiveScheduler>,
        shutdown: CancellationToken,
    ) -> Result<Self, rumqttc::ClientError> {
        let (host, port) = super::parse_host_port(broker_url);
        let mut options = MqttOptions::new(format!("{client_id}-sub"), host, port);
        options.set_keep_alive(Duration::from_secs(60));
        options.set_clean_session(true);
        if let (Some(user), Some(pass)) = (username, password) {
            options.set_credentials(user, pass);
        }

        let (client, mut eventloop) = AsyncClient::new(options, 256);

        for kind in SUBSCRIBED_KINDS {
            let pattern = Topic::subscription_pattern(topic_prefix, kind);
            client.subscribe(&pattern, QoS::AtLeastOnce).await?;
            info!(pattern, "subscribed to topic pattern");
        }

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("ingestion subscriber shutting down");
                        break;
                    }
                    event = eventloop.poll() => {
                        match event {
                            Ok(Event::Incoming(Packet::Publish(publish))) => {
                                let uow = uow.clone();
                                let cache = cache.clone();
                                let reactive = reactive.clone();
                                tokio::spawn(async move {
                                    if let Err(err) = handle_message(&publish.topic, &publish.payload, &uow, cache.as_ref(), &reactive).await {
                                        warn!(topic = %publish.topic, error = %err, "dropping message: handler failed");
                                    }
                                });
                            }
                            Ok(_) => {}
                            Err(err) => {
                                error!(error = %err, "ingestion eventloop error, rumqttc will reconnect");
                                tokio::time::sleep(Duration::from_millis(200)).await;
                            }
                        }
                    }
                }
            }
        });

        Ok(Subscriber { client })
    }

    pub async fn disconnect(&self) -> Result<(), rumqttc::ClientError> {
        self.client.disconnect().await
    }
}
