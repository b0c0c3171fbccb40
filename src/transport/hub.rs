//! Edge hub
//!
//! The hub stands in for the upstream broker when the module runs on its
//! own. It is responsible for:
//! - tracking connected peers and their route subscriptions
//! - delivering published messages to every subscriber of a route
//! - holding the input and configuration handlers registered by the module
//!
//! Concurrency and usage notes:
//! - The API is synchronous and meant to sit behind `Arc<Mutex<Hub>>`.
//!   Handlers are cloned out of the hub before they are awaited so the lock
//!   is never held across an `.await`.
//! - Delivery only pushes onto per-peer unbounded channels; the socket
//!   writes happen in each connection's send loop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, error, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::client::Client;
use crate::filter::message::Message;
use crate::transport::message::ServerFrame;
use crate::transport::route::{Route, SubscriberId};
use crate::transport::{ConfigHandler, InputHandler, OutputPublisher};
use crate::utils::error::TransportError;

#[derive(Default)]
pub struct Hub {
    pub routes: HashMap<String, Route>,
    pub clients: HashMap<SubscriberId, Client>,
    input_handlers: HashMap<String, Arc<dyn InputHandler>>,
    config_handlers: Vec<Arc<dyn ConfigHandler>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_client(&mut self, client: Client) {
        self.clients.insert(client.id.clone(), client);
    }

    pub fn remove_client(&mut self, client_id: &SubscriberId) {
        self.clients.remove(client_id);
    }

    /// Subscribe a peer to a route, creating the route on first use.
    pub fn subscribe(&mut self, route: &str, subscriber: SubscriberId) {
        self.routes
            .entry(route.to_string())
            .or_insert_with(|| Route::new(route))
            .subscribe(subscriber);
    }

    pub fn unsubscribe(&mut self, route: &str, subscriber: &SubscriberId) {
        if let Some(r) = self.routes.get_mut(route) {
            r.unsubscribe(subscriber);
        }
    }

    /// Register the handler invoked for every message sent to `route`.
    /// A later registration for the same route replaces the earlier one.
    pub fn subscribe_input(&mut self, route: &str, handler: Arc<dyn InputHandler>) {
        self.input_handlers.insert(route.to_string(), handler);
    }

    /// Register a handler for desired-properties updates.
    pub fn subscribe_config(&mut self, handler: Arc<dyn ConfigHandler>) {
        self.config_handlers.push(handler);
    }

    pub fn input_handler(&self, route: &str) -> Option<Arc<dyn InputHandler>> {
        self.input_handlers.get(route).cloned()
    }

    pub fn config_handlers(&self) -> Vec<Arc<dyn ConfigHandler>> {
        self.config_handlers.clone()
    }

    /// Deliver a message to every subscriber of `route`.
    ///
    /// Returns the number of peers that accepted the frame. A route whose
    /// subscribers all refuse the frame is reported as closed; a route with
    /// no subscribers is not an error.
    pub fn deliver(&self, route: &str, message: &Message) -> Result<usize, TransportError> {
        let subscribers = match self.routes.get(route) {
            Some(r) if !r.subscribers.is_empty() => &r.subscribers,
            _ => {
                warn!("No subscribers on route '{route}'; message dropped");
                return Ok(0);
            }
        };

        let payload = String::from_utf8(message.payload().to_vec())
            .map_err(|e| TransportError::Encoding(e.to_string()))?;
        let frame = ServerFrame::Message {
            route: route.to_string(),
            payload,
            properties: message.properties().clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        let ws_msg = WsMessage::text(serde_json::to_string(&frame)?);

        let mut delivered = 0;
        for sub_id in subscribers {
            match self.clients.get(sub_id) {
                Some(client) => match client.sender.send(ws_msg.clone()) {
                    Ok(()) => delivered += 1,
                    Err(e) => error!("Failed to send to {sub_id}: {e}"),
                },
                None => error!("No client registered with id: {sub_id}"),
            }
        }

        if delivered == 0 {
            return Err(TransportError::Closed {
                route: route.to_string(),
            });
        }
        debug!("Delivered message on '{route}' to {delivered} subscriber(s)");
        Ok(delivered)
    }

    /// Remove a peer and drop it from every route.
    pub fn cleanup_client(&mut self, client_id: &SubscriberId) {
        self.remove_client(client_id);

        for (name, route) in self.routes.iter_mut() {
            if route.subscribers.contains(client_id) {
                route.unsubscribe(client_id);
                debug!("Unsubscribed {client_id} from route {name}");
            }
        }

        debug!("Cleaned up client {client_id}");
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("routes", &self.routes)
            .field("clients", &self.clients.len())
            .field("input_routes", &self.input_handlers.keys().collect::<Vec<_>>())
            .field("config_handlers", &self.config_handlers.len())
            .finish()
    }
}

/// Lock the hub, recovering the guard if a previous holder panicked.
pub fn lock(hub: &Mutex<Hub>) -> MutexGuard<'_, Hub> {
    hub.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// `OutputPublisher` that delivers through a shared hub.
#[derive(Debug, Clone)]
pub struct HubPublisher {
    hub: Arc<Mutex<Hub>>,
}

impl HubPublisher {
    pub fn new(hub: Arc<Mutex<Hub>>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl OutputPublisher for HubPublisher {
    async fn publish(&self, route: &str, message: Message) -> Result<(), TransportError> {
        lock(&self.hub).deliver(route, &message).map(|_| ())
    }
}
