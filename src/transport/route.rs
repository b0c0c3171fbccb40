//! Route management
//!
//! A `Route` holds the ids of the peers subscribed to one named hub route.
//! Duplicate subscriptions are a no-op.
//!
//! Callers must synchronize access to `Route` (for example via the hub lock)
//! when modifying subscriptions.

use std::collections::HashSet;

pub type SubscriberId = String;

#[derive(Debug, Default)]
pub struct Route {
    pub name: String,
    pub subscribers: HashSet<SubscriberId>,
}

impl Route {
    /// Create a new route with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: HashSet::new(),
        }
    }

    /// Add a subscriber to the route. Duplicate adds are ignored.
    pub fn subscribe(&mut self, id: SubscriberId) {
        self.subscribers.insert(id);
    }

    /// Remove a subscriber from the route.
    pub fn unsubscribe(&mut self, id: &SubscriberId) {
        self.subscribers.remove(id);
    }
}
