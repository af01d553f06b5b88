use std::collections::HashMap;
use std::time::Duration;

use fleet_codec::{wire, SequenceAllocator};
use fleet_codec::topic::{Topic, TopicKind};
use fleet_db::{OrderExecutionRepository, TemplateRepository, UnitOfWork};
use fleet_types::common::OrderStatus;
use fleet_types::message::{Edge, Node, OrderMessage};
use fleet_transport::{TransportKind, TransportRegistry};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::synthesizer::CommandSynthesizer;
use crate::template_expander::expand_order;

/// An order ready to dispatch, assembled either from a template or inline
/// by the caller (spec §4.9 step 1).
pub struct OrderPlan {
    pub order_template_id: Option<u64>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Drives the order-execution state machine end to end (spec §4.9): build,
/// persist `CREATED`, publish, then record `SENT`/`FAILED`. Acknowledgement
/// and further progression are observed separately by the ingestion path
/// (state-message based, per the resolution of spec §9's open question —
/// see DESIGN.md) and are not this type's responsibility.
pub struct OrderExecutor<'a> {
    uow: &'a UnitOfWork,
    transport: &'a TransportRegistry,
    sequence: &'a SequenceAllocator,
    topic_prefix: String,
    default_manufacturer: String,
}

impl<'a> OrderExecutor<'a> {
    pub fn new(
        uow: &'a UnitOfWork,
        transport: &'a TransportRegistry,
        sequence: &'a SequenceAllocator,
        topic_prefix: impl Into<String>,
        default_manufacturer: impl Into<String>,
    ) -> Self {
        OrderExecutor {
            uow,
            transport,
            sequence,
            topic_prefix: topic_prefix.into(),
            default_manufacturer: default_manufacturer.into(),
        }
    }

    /// Resolves a stored template into an [`OrderPlan`] (spec §4.7).
    pub async fn plan_from_template(
        &self,
        template_id: u64,
        overrides: &HashMap<String, Value>,
    ) -> Result<OrderPlan> {
        let resolved = TemplateRepository::load_order(self.uow.pool().pool(), template_id).await?;
        let (nodes, edges) = expand_order(&resolved, overrides, self.sequence);
        Ok(OrderPlan {
            order_template_id: Some(template_id),
            nodes,
            edges,
        })
    }

    /// Runs spec §4.9 steps 2-3: persist `CREATED`, publish, then record
    /// `SENT` or `FAILED` in a second transaction regardless of publish
    /// outcome.
    pub async fn dispatch(
        &self,
        serial: &str,
        known_manufacturer: Option<&str>,
        plan: OrderPlan,
        transport_kind: Option<TransportKind>,
    ) -> Result<String> {
        let synthesizer = CommandSynthesizer::new(self.sequence, self.default_manufacturer.clone());
        let order_id = Uuid::new_v4().to_string();
        let message = synthesizer.build_order(serial, known_manufacturer, order_id.clone(), 0, plan.nodes, plan.edges);

        let mut tx = self.uow.begin().await?;
        OrderExecutionRepository::create(&mut tx, &message.order_id, plan.order_template_id, serial, message.order_update_id).await?;
        tx.commit().await?;

        let publish_result = self.publish_order(&message, transport_kind).await;

        let mut tx = self.uow.begin().await?;
        match publish_result {
            Ok(()) => {
                OrderExecutionRepository::update_status(&mut tx, &message.order_id, OrderStatus::Sent, None).await?;
                tx.commit().await?;
                info!(order_id = %message.order_id, serial, "order dispatched");
            }
            Err(err) => {
                OrderExecutionRepository::update_status(&mut tx, &message.order_id, OrderStatus::Failed, Some(&err.to_string())).await?;
                tx.commit().await?;
                warn!(order_id = %message.order_id, serial, error = %err, "order publish failed");
            }
        }

        Ok(message.order_id)
    }

    async fn publish_order(&self, message: &OrderMessage, transport_kind: Option<TransportKind>) -> Result<()> {
        let payload = wire::encode(message)?;
        let destination = match transport_kind {
            Some(TransportKind::Http) | Some(TransportKind::WebSocket) => message.serial_number.clone(),
            _ => Topic {
                prefix: self.topic_prefix.clone(),
                manufacturer: message.manufacturer.clone(),
                serial: message.serial_number.clone(),
                kind: TopicKind::Order,
            }
            .format(),
        };

        // The publish-ack wait is bounded at 5s and detached from the
        // caller per spec §5, but the executor itself still awaits the
        // broker/HTTP/WS send call completing (or erroring) before
        // recording SENT/FAILED.
        tokio::time::timeout(Duration::from_secs(5), self.transport.publish(transport_kind, &destination, &payload))
            .await
            .map_err(|_| fleet_transport::TransportError::Timeout(5_000))??;
        Ok(())
    }

    /// Moves a non-final order to `CANCELLED` and publishes a
    /// `cancelOrder` instant action; the publish result does not gate the
    /// DB transition (spec §4.9 step 5).
    pub async fn cancel(&self, order_id: &str, serial: &str, known_manufacturer: Option<&str>, reason: Option<&str>) -> Result<()> {
        let mut tx = self.uow.begin().await?;
        OrderExecutionRepository::update_status(&mut tx, order_id, OrderStatus::Cancelled, reason).await?;
        tx.commit().await?;

        let synthesizer = CommandSynthesizer::new(self.sequence, self.default_manufacturer.clone());
        let message = synthesizer.build_cancel_order(serial, known_manufacturer);
        let payload = wire::encode(&message)?;
        let topic = Topic {
            prefix: self.topic_prefix.clone(),
            manufacturer: message.manufacturer.clone(),
            serial: serial.to_string(),
            kind: TopicKind::InstantActions,
        }
        .format();

        if let Err(err) = self.transport.publish(None, &topic, &payload).await {
            error!(order_id, serial, error = %err, "cancelOrder publish failed, DB transition already committed");
        }

        Ok(())
    }
}
