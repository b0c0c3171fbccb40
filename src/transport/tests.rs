use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

use super::hub::{Hub, HubPublisher};
use super::message::{ClientFrame, ServerFrame};
use super::route::Route;
use super::websocket::{dispatch, dispatch_queue_depth};
use super::{AckDecision, ChannelPublisher, InputHandler, OutputPublisher};
use crate::client::Client;
use crate::filter::{FilterEngine, Message, ThresholdConfig};
use crate::utils::error::TransportError;

struct PanickingHandler;

#[async_trait]
impl InputHandler for PanickingHandler {
    async fn handle(&self, _message: Message) -> AckDecision {
        panic!("boom");
    }
}

fn hub_with_subscriber(route: &str) -> (Hub, mpsc::UnboundedReceiver<WsMessage>) {
    let mut hub = Hub::new();
    let (tx, rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let client_id = client.id.clone();
    hub.register_client(client);
    hub.subscribe(route, client_id);
    (hub, rx)
}

#[test]
fn test_route_new() {
    let route = Route::new("output1");
    assert_eq!(route.name, "output1");
    assert!(route.subscribers.is_empty());
}

#[test]
fn test_route_subscribe_and_unsubscribe() {
    let mut route = Route::new("output1");
    route.subscribe("client1".to_string());
    route.subscribe("client1".to_string());
    assert_eq!(route.subscribers.len(), 1);
    route.unsubscribe(&"client1".to_string());
    assert!(!route.subscribers.contains("client1"));
}

#[test]
fn test_hub_register_and_remove_client() {
    let mut hub = Hub::new();
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let client_id = client.id.clone();

    hub.register_client(client);
    assert!(hub.clients.contains_key(&client_id));

    hub.remove_client(&client_id);
    assert!(!hub.clients.contains_key(&client_id));
}

#[test]
fn test_hub_deliver_to_subscriber() {
    let (hub, mut rx) = hub_with_subscriber("output1");
    let message = Message::new(r#"{"machine":{"temperature":30}}"#).with_property("MessageType", "Alert");

    assert_eq!(hub.deliver("output1", &message).unwrap(), 1);

    let received = rx.try_recv().unwrap();
    if let WsMessage::Text(text) = received {
        match serde_json::from_str::<ServerFrame>(&text).unwrap() {
            ServerFrame::Message {
                route,
                payload,
                properties,
                ..
            } => {
                assert_eq!(route, "output1");
                assert_eq!(payload, r#"{"machine":{"temperature":30}}"#);
                assert_eq!(properties.get("MessageType").map(String::as_str), Some("Alert"));
            }
            other => panic!("Expected a message frame, got {other:?}"),
        }
    } else {
        panic!("Expected a text message");
    }
}

#[test]
fn test_hub_deliver_without_subscribers_is_ok() {
    let hub = Hub::new();
    assert_eq!(hub.deliver("output1", &Message::new("{}")).unwrap(), 0);
}

#[test]
fn test_hub_deliver_to_closed_channel_fails() {
    let (hub, rx) = hub_with_subscriber("output1");
    drop(rx);

    let result = hub.deliver("output1", &Message::new("{}"));
    assert!(matches!(result, Err(TransportError::Closed { route }) if route == "output1"));
}

#[test]
fn test_hub_deliver_rejects_non_utf8_payload() {
    let (hub, _rx) = hub_with_subscriber("output1");
    let result = hub.deliver("output1", &Message::new(vec![0xff, 0xfe]));
    assert!(matches!(result, Err(TransportError::Encoding(_))));
}

#[test]
fn test_hub_cleanup_client() {
    let mut hub = Hub::new();
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let client_id = client.id.clone();
    hub.register_client(client);
    hub.subscribe("output1", client_id.clone());

    hub.cleanup_client(&client_id);
    assert!(!hub.clients.contains_key(&client_id));
    let route = hub.routes.get("output1").unwrap();
    assert!(!route.subscribers.contains(&client_id));
}

#[test]
fn test_hub_handler_registration() {
    let mut hub = Hub::new();
    let (publisher, _rx) = ChannelPublisher::new();
    let engine = Arc::new(FilterEngine::new(
        Arc::new(ThresholdConfig::default()),
        Arc::new(publisher),
        "output1",
    ));

    assert!(hub.input_handler("input1").is_none());
    hub.subscribe_input("input1", engine.clone());
    hub.subscribe_config(engine.clone());

    assert!(hub.input_handler("input1").is_some());
    assert!(hub.input_handler("input2").is_none());

    for handler in hub.config_handlers() {
        handler.on_desired_properties(&json!({ "TemperatureThreshold": 12 }));
    }
    assert_eq!(engine.threshold().get(), 12.0);
}

#[tokio::test]
async fn test_hub_publisher_routes_engine_output() {
    let (hub, mut rx) = hub_with_subscriber("output1");
    let hub = Arc::new(Mutex::new(hub));
    let engine = FilterEngine::new(
        Arc::new(ThresholdConfig::default()),
        Arc::new(HubPublisher::new(hub.clone())),
        "output1",
    );

    let ack = engine
        .handle_message(Message::new(r#"{"machine":{"temperature":31}}"#))
        .await;
    assert_eq!(ack, AckDecision::Completed);
    assert!(matches!(rx.try_recv().unwrap(), WsMessage::Text(_)));
}

#[tokio::test]
async fn test_channel_publisher_closed() {
    let (publisher, rx) = ChannelPublisher::new();
    drop(rx);
    let result = publisher.publish("output1", Message::new("{}")).await;
    assert!(matches!(result, Err(TransportError::Closed { .. })));
}

#[tokio::test]
async fn test_dispatch_returns_handler_outcome() {
    let (publisher, _rx) = ChannelPublisher::new();
    let engine: Arc<dyn InputHandler> = Arc::new(FilterEngine::new(
        Arc::new(ThresholdConfig::default()),
        Arc::new(publisher),
        "output1",
    ));
    let ack = dispatch(engine, Message::new("not json")).await;
    assert_eq!(ack, AckDecision::Completed);
}

#[tokio::test]
async fn test_dispatch_turns_panic_into_abandoned() {
    let ack = dispatch(Arc::new(PanickingHandler), Message::new("{}")).await;
    assert_eq!(ack, AckDecision::Abandoned);
}

#[test]
fn test_client_frame_parsing() {
    let frame: ClientFrame = serde_json::from_value(json!({
        "type": "send",
        "route": "input1",
        "payload": "{\"machine\":{\"temperature\":30}}"
    }))
    .unwrap();
    match frame {
        ClientFrame::Send {
            route,
            properties,
            message_id,
            ..
        } => {
            assert_eq!(route, "input1");
            assert!(properties.is_empty());
            assert!(message_id.is_none());
        }
        other => panic!("Expected a send frame, got {other:?}"),
    }

    let frame: ClientFrame = serde_json::from_value(json!({
        "type": "desired",
        "properties": { "TemperatureThreshold": 10 }
    }))
    .unwrap();
    assert!(matches!(frame, ClientFrame::Desired { .. }));
}

#[test]
fn test_ack_frame_wire_format() {
    let frame = ServerFrame::Ack {
        message_id: "m1".to_string(),
        outcome: AckDecision::Abandoned,
    };
    let value = serde_json::to_value(&frame).unwrap();
    assert_eq!(
        value,
        json!({ "type": "ack", "message_id": "m1", "outcome": "abandoned" })
    );
}

#[test]
fn test_dispatch_queue_depth_scales_with_limit() {
    assert_eq!(dispatch_queue_depth(2), 8);
    assert_eq!(dispatch_queue_depth(64), 256);
    // a zero limit is clamped to one slot
    assert_eq!(dispatch_queue_depth(0), 4);
}
