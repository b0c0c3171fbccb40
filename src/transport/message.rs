//! Wire frames exchanged with hub peers over WebSocket.
//!
//! Payloads travel as text since WebSocket text frames are UTF-8 already;
//! properties are a flat string map.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::message::Properties;
use crate::transport::AckDecision;

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    #[serde(rename = "subscribe")]
    Subscribe { route: String },
    #[serde(rename = "unsubscribe")]
    Unsubscribe { route: String },
    #[serde(rename = "send")]
    Send {
        route: String,
        payload: String,
        #[serde(default)]
        properties: Properties,
        message_id: Option<String>,
    },
    #[serde(rename = "desired")]
    Desired { properties: Value },
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    #[serde(rename = "message")]
    Message {
        route: String,
        payload: String,
        properties: Properties,
        timestamp: i64,
    },
    #[serde(rename = "ack")]
    Ack {
        message_id: String,
        outcome: AckDecision,
    },
    #[serde(rename = "error")]
    Error { message: String },
}
