//! Client representation
//!
//! `Client` models a peer connected to the edge hub and holds the sending
//! side of its outbound channel. The hub pushes frames onto the channel and
//! the connection's send loop writes them to the socket.

use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

#[derive(Debug)]
pub struct Client {
    /// Unique identifier for the peer (a UUID).
    pub id: String,

    /// Channel to send WebSocket frames to the peer.
    pub sender: UnboundedSender<WsMessage>,
}

impl Client {
    /// Create a new client with a sender channel and a fresh id.
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
        }
    }
}
