//! Scenario tests S1-S6 (spec §8). Each wires the real ingestion handler
//! and order executor against a live Postgres (`TEST_DATABASE_URL`) and an
//! in-memory cache/transport fake, since the behavior under test spans
//! `fleet-db`, `fleet-ingest` and `fleet-dispatch` together and no single
//! crate's unit tests can exercise the whole path.
//!
//! Requires a scratch database; skips (with a message) if `TEST_DATABASE_URL`
//! is unset, the way the teacher's own DB-backed suites are gated on an env
//! var rather than failing CI runs that have no Postgres available.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use fleet_cache::fake::FakeCache;
use fleet_cache::{LiveStateCache, LiveStateCacheExt};
use fleet_codec::{wire, SequenceAllocator};
use fleet_db::{DbPool, OrderExecutionRepository, TemplateRepository, UnitOfWork};
use fleet_dispatch::{OrderExecutor, OrderPlan};
use fleet_ingest::handler::handle_message;
use fleet_ingest::ReactiveScheduler;
use fleet_transport::{Result as TransportResult, Transport, TransportKind, TransportRegistry};
use fleet_types::common::{BlockingType, ParameterValueType};
use fleet_types::entity::ConnectionState;
use fleet_types::message::{Edge, Node, NodePosition};

/// Captures every publish so assertions can inspect topic/payload pairs
/// without a real broker, mirroring `registry::tests::CountingTransport`.
struct CapturingTransport {
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl CapturingTransport {
    fn new() -> Self {
        CapturingTransport { published: Mutex::new(Vec::new()) }
    }

    fn calls(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for CapturingTransport {
    async fn publish(&self, destination: &str, payload: &[u8]) -> TransportResult<()> {
        self.published.lock().unwrap().push((destination.to_string(), payload.to_vec()));
        Ok(())
    }

    async fn close(&self) -> TransportResult<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}

async fn test_db() -> Option<DbPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    match DbPool::connect(&url).await {
        Ok(pool) => Some(pool),
        Err(err) => {
            eprintln!("skipping: could not connect to TEST_DATABASE_URL: {err}");
            None
        }
    }
}

fn connection_payload(serial: &str, state: &str, header_id: i64) -> Vec<u8> {
    format!(
        r#"{{"headerId":{header_id},"serialNumber":"{serial}","connectionState":"{state}","manufacturer":"Acme","timestamp":"2024-01-01T00:00:00Z","version":"2.0"}}"#
    )
    .into_bytes()
}

#[tokio::test]
async fn s1_online_triggers_factsheet_request() {
    let Some(db) = test_db().await else { return };
    let uow = UnitOfWork::new(db);
    let cache: Arc<dyn LiveStateCache> = Arc::new(FakeCache::default());
    let transport = Arc::new(CapturingTransport::new());
    let mut registry = TransportRegistry::new(TransportKind::Broker);
    registry.register(TransportKind::Broker, transport.clone());
    let registry = Arc::new(registry);

    let sequence = Arc::new(SequenceAllocator::new());
    let reactive = ReactiveScheduler::new(sequence, registry, "meili", "Roboligent");

    let topic = "meili/v2/Acme/s1-r1/connection";
    let payload = connection_payload("s1-r1", "ONLINE", 7);
    handle_message(topic, &payload, &uow, cache.as_ref(), &reactive).await.unwrap();

    let state = get_connection_state(&uow, "s1-r1").await;
    assert_eq!(state.state, fleet_types::common::ConnectionStateKind::Online);
    assert_eq!(cache.get_connection_status("s1-r1").await, fleet_types::common::ConnectionStateKind::Online);

    // the reactive factsheet request fires on its own task, 1s delayed
    tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;
    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    let (published_topic, payload) = &calls[0];
    assert_eq!(published_topic, "meili/v2/Acme/s1-r1/instantActions");
    let message: fleet_types::message::InstantActionMessage = wire::decode_instant_action(payload).unwrap();
    assert_eq!(message.actions[0].action_type, "factsheetRequest");
    assert_eq!(message.header_id, 1);
}

async fn get_connection_state(uow: &UnitOfWork, serial: &str) -> ConnectionState {
    fleet_db::ConnectionRepository::get(uow.pool().pool(), serial).await.unwrap()
}

#[tokio::test]
async fn s2_uninitialized_position_triggers_init_position() {
    let Some(db) = test_db().await else { return };
    let uow = UnitOfWork::new(db);
    let cache: Arc<dyn LiveStateCache> = Arc::new(FakeCache::default());
    let transport = Arc::new(CapturingTransport::new());
    let mut registry = TransportRegistry::new(TransportKind::Broker);
    registry.register(TransportKind::Broker, transport.clone());
    let registry = Arc::new(registry);

    let sequence = Arc::new(SequenceAllocator::new());
    let reactive = ReactiveScheduler::new(sequence, registry, "meili", "Roboligent");

    let topic = "meili/v2/Acme/s2-r1/state";
    let payload = br#"{
        "headerId": 1, "timestamp": "2024-01-01T00:00:00Z", "version": "2.0",
        "manufacturer": "Acme", "serialNumber": "s2-r1",
        "agvPosition": {"x":0.0,"y":0.0,"theta":0.0,"mapId":"","positionInitialized":false},
        "batteryState": {"batteryCharge": 0.8},
        "safetyState": {"eStop":"NONE","fieldViolation":false},
        "driving": false, "operatingMode": "AUTOMATIC"
    }"#;
    handle_message(topic, payload, &uow, cache.as_ref(), &reactive).await.unwrap();

    assert!(cache.get_state("s2-r1").await.is_some());

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    let message: fleet_types::message::InstantActionMessage = wire::decode_instant_action(&calls[0].1).unwrap();
    assert_eq!(message.actions[0].action_type, "initPosition");
    assert_eq!(message.actions[0].action_parameters[0].key, "pose");
    let pose = &message.actions[0].action_parameters[0].value;
    assert_eq!(pose["lastNodeId"], "");
    assert_eq!(pose["mapId"], "");
    assert_eq!(pose["x"], 0.0);
}

#[tokio::test]
async fn s3_factsheet_replace_drops_stale_actions() {
    let Some(db) = test_db().await else { return };
    let uow = UnitOfWork::new(db);

    let f1 = factsheet_with_actions("s3-r1", &["A"]);
    let f2 = factsheet_with_actions("s3-r1", &["B", "C"]);

    let mut tx = uow.begin().await.unwrap();
    fleet_db::FactsheetRepository::save_or_update(&mut tx, &f1).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = uow.begin().await.unwrap();
    fleet_db::FactsheetRepository::save_or_update(&mut tx, &f2).await.unwrap();
    tx.commit().await.unwrap();

    let sheet = fleet_db::FactsheetRepository::get(uow.pool().pool(), "s3-r1").await.unwrap();
    let types: Vec<&str> = sheet.actions.iter().map(|a| a.action.action_type.as_str()).collect();
    assert_eq!(types, vec!["B", "C"]);
}

fn factsheet_with_actions(serial: &str, action_types: &[&str]) -> fleet_types::message::FactsheetMessage {
    use fleet_types::message::*;
    FactsheetMessage {
        header_id: 1,
        manufacturer: "Acme".to_string(),
        serial_number: serial.to_string(),
        timestamp: Utc::now(),
        version: "2.0".to_string(),
        protocol_features: ProtocolFeatures {
            agv_actions: action_types
                .iter()
                .map(|t| AgvActionWire {
                    action_type: t.to_string(),
                    description: None,
                    action_scopes: Vec::new(),
                    result_description: None,
                    action_parameters: Vec::new(),
                })
                .collect(),
            optional_parameters: Vec::new(),
        },
        physical_parameters: PhysicalParameters {
            accel_max: 1.0,
            decel_max: 1.0,
            height_min: None,
            height_max: None,
            length: 1.0,
            width: 1.0,
            speed_min: 0.0,
            speed_max: 2.0,
        },
        type_specification: TypeSpecification {
            agv_class: "FORKLIFT".to_string(),
            agv_kinematic: "DIFF".to_string(),
            localization_types: vec!["NATURAL".to_string()],
            navigation_types: vec!["AUTONOMOUS".to_string()],
            max_load_mass: 100.0,
            series_name: "X".to_string(),
            series_description: None,
        },
    }
}

#[tokio::test]
async fn s4_template_execution_applies_override() {
    let Some(db) = test_db().await else { return };
    let uow = UnitOfWork::new(db);
    let sequence = Arc::new(SequenceAllocator::new());
    let transport = Arc::new(CapturingTransport::new());
    let mut registry = TransportRegistry::new(TransportKind::Broker);
    registry.register(TransportKind::Broker, transport.clone());
    let registry = Arc::new(registry);

    let mut tx = uow.begin().await.unwrap();
    let action_id = TemplateRepository::create_action_template(&mut tx, "pick", None, BlockingType::Hard, None)
        .await
        .unwrap();
    TemplateRepository::add_action_parameter(&mut tx, action_id, "speed", "1.0", ParameterValueType::Number)
        .await
        .unwrap();
    let node = fleet_types::template::NodeTemplate {
        id: 0,
        node_id: "n1".to_string(),
        name: "N1".to_string(),
        description: None,
        sequence_id: 0,
        released: true,
        pose: fleet_types::template::NodeTemplatePose {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
            allowed_deviation_xy: 0.0,
            allowed_deviation_theta: 0.0,
            map_id: "m1".to_string(),
        },
        action_template_ids: vec![action_id],
    };
    let node_id = TemplateRepository::create_node_template(&mut tx, &node).await.unwrap();
    let order_template_id = TemplateRepository::create_order_template(&mut tx, "T", None, &[node_id], &[])
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let executor = OrderExecutor::new(&uow, &registry, &sequence, "meili", "Roboligent");
    let mut overrides = HashMap::new();
    overrides.insert("speed".to_string(), serde_json::json!(2.5));
    let plan = executor.plan_from_template(order_template_id, &overrides).await.unwrap();
    assert_eq!(plan.nodes[0].actions[0].action_parameters[0].value, serde_json::json!(2.5));

    let order_id = executor.dispatch("s4-r1", Some("Acme"), plan, None).await.unwrap();

    let execution = OrderExecutionRepository::get(uow.pool().pool(), &order_id).await.unwrap();
    assert_eq!(execution.status, fleet_types::common::OrderStatus::Sent);

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    let order: fleet_types::message::OrderMessage = wire::decode_order(&calls[0].1).unwrap();
    assert_eq!(order.nodes[0].actions[0].action_type, "pick");
    assert_eq!(order.nodes[0].actions[0].action_parameters[0].value, serde_json::json!(2.5));
}

#[tokio::test]
async fn order_advances_from_observed_state_messages() {
    let Some(db) = test_db().await else { return };
    let uow = UnitOfWork::new(db);
    let cache: Arc<dyn LiveStateCache> = Arc::new(FakeCache::default());
    let sequence = Arc::new(SequenceAllocator::new());
    let transport = Arc::new(CapturingTransport::new());
    let mut registry = TransportRegistry::new(TransportKind::Broker);
    registry.register(TransportKind::Broker, transport.clone());
    let registry = Arc::new(registry);
    let reactive = ReactiveScheduler::new(sequence.clone(), registry.clone(), "meili", "Roboligent");

    let executor = OrderExecutor::new(&uow, &registry, &sequence, "meili", "Roboligent");
    let plan = OrderPlan {
        order_template_id: None,
        nodes: vec![Node {
            node_id: "n1".to_string(),
            sequence_id: 0,
            node_description: None,
            released: true,
            node_position: Some(NodePosition {
                x: 0.0,
                y: 0.0,
                theta: 0.0,
                allowed_deviation_xy: 0.0,
                allowed_deviation_theta: 0.0,
                map_id: "m1".to_string(),
            }),
            actions: Vec::new(),
        }],
        edges: Vec::<Edge>::new(),
    };
    let order_id = executor.dispatch("s7-r1", Some("Acme"), plan, None).await.unwrap();

    let execution = OrderExecutionRepository::get(uow.pool().pool(), &order_id).await.unwrap();
    assert_eq!(execution.status, fleet_types::common::OrderStatus::Sent);

    let state_payload = format!(
        r#"{{
            "headerId": 1, "timestamp": "2024-01-01T00:00:00Z", "version": "2.0",
            "manufacturer": "Acme", "serialNumber": "s7-r1", "orderId": "{order_id}",
            "agvPosition": {{"x":0.0,"y":0.0,"theta":0.0,"mapId":"m1","positionInitialized":true}},
            "batteryState": {{"batteryCharge": 0.8}},
            "safetyState": {{"eStop":"NONE","fieldViolation":false}},
            "driving": true, "operatingMode": "AUTOMATIC"
        }}"#
    )
    .into_bytes();
    let topic = "meili/v2/Acme/s7-r1/state";

    handle_message(topic, &state_payload, &uow, cache.as_ref(), &reactive).await.unwrap();
    let execution = OrderExecutionRepository::get(uow.pool().pool(), &order_id).await.unwrap();
    assert_eq!(execution.status, fleet_types::common::OrderStatus::Acknowledged);

    handle_message(topic, &state_payload, &uow, cache.as_ref(), &reactive).await.unwrap();
    let execution = OrderExecutionRepository::get(uow.pool().pool(), &order_id).await.unwrap();
    assert_eq!(execution.status, fleet_types::common::OrderStatus::Executing);
    assert!(execution.started_at.is_some());

    // a third observation finds the order already EXECUTING and is a no-op
    handle_message(topic, &state_payload, &uow, cache.as_ref(), &reactive).await.unwrap();
    let execution = OrderExecutionRepository::get(uow.pool().pool(), &order_id).await.unwrap();
    assert_eq!(execution.status, fleet_types::common::OrderStatus::Executing);
}

#[tokio::test]
async fn s5_cancel_is_terminal() {
    let Some(db) = test_db().await else { return };
    let uow = UnitOfWork::new(db);
    let sequence = Arc::new(SequenceAllocator::new());
    let transport = Arc::new(CapturingTransport::new());
    let mut registry = TransportRegistry::new(TransportKind::Broker);
    registry.register(TransportKind::Broker, transport.clone());
    let registry = Arc::new(registry);

    let executor = OrderExecutor::new(&uow, &registry, &sequence, "meili", "Roboligent");
    let plan = OrderPlan {
        order_template_id: None,
        nodes: vec![Node {
            node_id: "n1".to_string(),
            sequence_id: 0,
            node_description: None,
            released: true,
            node_position: Some(NodePosition {
                x: 0.0,
                y: 0.0,
                theta: 0.0,
                allowed_deviation_xy: 0.0,
                allowed_deviation_theta: 0.0,
                map_id: "m1".to_string(),
            }),
            actions: Vec::new(),
        }],
        edges: Vec::<Edge>::new(),
    };
    let order_id = executor.dispatch("s5-r1", Some("Acme"), plan, None).await.unwrap();

    let mut tx = uow.begin().await.unwrap();
    OrderExecutionRepository::update_status(&mut tx, &order_id, fleet_types::common::OrderStatus::Executing, None)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    executor.cancel(&order_id, "s5-r1", Some("Acme"), Some("operator requested")).await.unwrap();

    let execution = OrderExecutionRepository::get(uow.pool().pool(), &order_id).await.unwrap();
    assert_eq!(execution.status, fleet_types::common::OrderStatus::Cancelled);
    assert!(execution.completed_at.is_some());

    let mut tx = uow.begin().await.unwrap();
    let result = OrderExecutionRepository::update_status(&mut tx, &order_id, fleet_types::common::OrderStatus::Completed, None).await;
    assert!(result.is_err(), "a terminal order must reject further transitions");
}

#[tokio::test]
async fn s6_transport_override_skips_broker() {
    let Some(db) = test_db().await else { return };
    let uow = UnitOfWork::new(db);
    let sequence = Arc::new(SequenceAllocator::new());
    let broker = Arc::new(CapturingTransport::new());
    let http = Arc::new(CapturingTransport::new());
    let mut registry = TransportRegistry::new(TransportKind::Broker);
    registry.register(TransportKind::Broker, broker.clone());
    registry.register(TransportKind::Http, http.clone());
    let registry = Arc::new(registry);

    let executor = OrderExecutor::new(&uow, &registry, &sequence, "meili", "Roboligent");
    let plan = OrderPlan { order_template_id: None, nodes: Vec::new(), edges: Vec::new() };

    executor
        .dispatch("s6-r1", Some("Acme"), plan, Some(TransportKind::Http))
        .await
        .unwrap();

    assert!(broker.calls().is_empty(), "broker must not receive a publish when /http is requested");
    assert_eq!(http.calls().len(), 1);
}

/// S6 as the operator actually issues it: `POST /api/v1/robots/{serial}/order/http`
/// through the real axum router (`fleet_api::build_router`), not by calling
/// `OrderExecutor` directly — exercises the path-suffix route added for the
/// literal `/order/http` form named in spec §8 scenario S6.
#[tokio::test]
async fn s6_http_router_routes_order_http_path_to_http_transport() {
    let Some(db) = test_db().await else { return };
    let uow = UnitOfWork::new(db);
    let cache: Arc<dyn LiveStateCache> = Arc::new(FakeCache::default());
    let broker = Arc::new(CapturingTransport::new());
    let http = Arc::new(CapturingTransport::new());
    let mut registry = TransportRegistry::new(TransportKind::Broker);
    registry.register(TransportKind::Broker, broker.clone());
    registry.register(TransportKind::Http, http.clone());
    let transport = Arc::new(registry);
    let sequence = Arc::new(SequenceAllocator::new());

    let state = Arc::new(fleet_api::AppState {
        uow,
        cache,
        transport,
        sequence,
        topic_prefix: "meili".to_string(),
        default_manufacturer: "Roboligent".to_string(),
        app_version: "test".to_string(),
    });

    let app = fleet_api::build_router(state);
    let body = serde_json::json!({ "nodes": [], "edges": [] });
    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .method("POST")
            .uri("/api/v1/robots/s6-http-r1/order/http")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = http_body_util::BodyExt::collect(response.into_body()).await.unwrap().to_bytes();
    let dispatched: fleet_api::dto::OrderDispatchedResponse = serde_json::from_slice(&body).unwrap();
    assert!(!dispatched.order_id.is_empty());

    assert!(broker.calls().is_empty(), "broker must not receive a publish when /order/http is requested");
    assert_eq!(http.calls().len(), 1);
}
