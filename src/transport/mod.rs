//! The `transport` module is the boundary between the filter and whatever
//! moves messages in and out of the module.
//!
//! It defines the contracts the filter relies on (`InputHandler`,
//! `ConfigHandler`, `OutputPublisher`) and the acknowledgment they exchange,
//! plus a small WebSocket edge hub that implements them for the binary.

pub mod hub;
pub mod message;
pub mod route;
pub mod websocket;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::filter::message::Message;
use crate::utils::error::TransportError;

pub use hub::{Hub, HubPublisher};
pub use websocket::start_websocket_server;

/// Completion status reported back for each inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckDecision {
    /// Handling finished; the transport may release the message.
    Completed,
    /// Handling did not finish; the message is eligible for redelivery.
    Abandoned,
}

/// Handler registered for an input route.
#[async_trait]
pub trait InputHandler: Send + Sync {
    async fn handle(&self, message: Message) -> AckDecision;
}

/// Handler registered for desired-properties updates.
pub trait ConfigHandler: Send + Sync {
    fn on_desired_properties(&self, desired: &Value);
}

/// Capability to publish a message on a named output route.
#[async_trait]
pub trait OutputPublisher: Send + Sync {
    async fn publish(&self, route: &str, message: Message) -> Result<(), TransportError>;
}

/// Publisher that hands every message to an in-process channel.
///
/// Once the receiving side is dropped every publish fails with
/// `TransportError::Closed`.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: UnboundedSender<(String, Message)>,
}

impl ChannelPublisher {
    pub fn new() -> (Self, UnboundedReceiver<(String, Message)>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl OutputPublisher for ChannelPublisher {
    async fn publish(&self, route: &str, message: Message) -> Result<(), TransportError> {
        self.sender
            .send((route.to_string(), message))
            .map_err(|_| TransportError::Closed {
                route: route.to_string(),
            })
    }
}
