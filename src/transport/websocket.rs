//! WebSocket transport
//!
//! This file implements the hub's WebSocket server. Responsibilities:
//! - Accept TCP/WebSocket connections and register a `Client` per peer
//! - Translate `ClientFrame`s into hub operations
//! - Dispatch `send` frames to the input handler of their route, with a
//!   bounded number of handler invocations in flight, and answer each with
//!   exactly one `ack` frame
//! - Hand `desired` frames to every registered configuration handler
//!
//! `send` frames go through a bounded per-connection queue drained by a
//! dispatcher task that waits for a free dispatch slot. The read loop only
//! waits once that queue is full, so a saturated filter pushes back on the
//! peer without holding up `desired` frames queued behind in-flight
//! messages.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_tungstenite::accept_async;
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::client::Client;
use crate::filter::message::Message;
use crate::transport::hub::{Hub, lock};
use crate::transport::message::{ClientFrame, ServerFrame};
use crate::transport::{AckDecision, InputHandler};
use crate::utils::error::FilterError;

const DISPATCH_QUEUE_FACTOR: usize = 4;

/// A `send` frame waiting for a dispatch slot.
struct PendingDispatch {
    handler: Arc<dyn InputHandler>,
    message: Message,
    message_id: String,
}

/// Bind `addr` and serve hub peers.
pub async fn start_websocket_server(
    addr: String,
    hub: Arc<Mutex<Hub>>,
    max_in_flight: usize,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("Edge hub listening on ws://{addr}");
    serve(listener, hub, max_in_flight).await;
    Ok(())
}

/// Accept connections from an already bound listener.
pub async fn serve(listener: TcpListener, hub: Arc<Mutex<Hub>>, max_in_flight: usize) {
    let in_flight = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let queue_depth = dispatch_queue_depth(max_in_flight);

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                spawn(handle_connection(
                    stream,
                    peer,
                    hub.clone(),
                    in_flight.clone(),
                    queue_depth,
                ));
            }
            Err(e) => warn!("Failed to accept connection: {e}"),
        }
    }
}

/// Number of `send` frames a connection may queue ahead of the dispatcher
/// before its read loop waits.
pub fn dispatch_queue_depth(max_in_flight: usize) -> usize {
    max_in_flight.max(1) * DISPATCH_QUEUE_FACTOR
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    hub: Arc<Mutex<Hub>>,
    in_flight: Arc<Semaphore>,
    queue_depth: usize,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake error from {peer}: {e}");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx.clone());
    let client_id = client.id.clone();
    lock(&hub).register_client(client);
    info!("Connection opened: {client_id} ({peer})");

    let cleanup_called = Arc::new(AtomicBool::new(false));

    let do_cleanup = {
        let hub = hub.clone();
        let client_id = client_id.clone();
        let cleanup_called = cleanup_called.clone();

        move || {
            if !cleanup_called.swap(true, Ordering::SeqCst) {
                lock(&hub).cleanup_client(&client_id);
            }
        }
    };

    {
        let client_id = client_id.clone();
        let do_cleanup = do_cleanup.clone();

        spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    warn!("Failed to send message to {client_id}: {e}");
                    break;
                }
            }

            do_cleanup();
            debug!("Send loop closed for {client_id}");
        });
    }

    let (dispatch_tx, mut dispatch_rx) = mpsc::channel::<PendingDispatch>(queue_depth);
    {
        let tx = tx.clone();

        spawn(async move {
            while let Some(pending) = dispatch_rx.recv().await {
                let permit = match in_flight.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        error!("Dispatch slots unavailable: {e}");
                        break;
                    }
                };
                let tx = tx.clone();
                spawn(async move {
                    let PendingDispatch {
                        handler,
                        message,
                        message_id,
                    } = pending;
                    let outcome = dispatch(handler, message).await;
                    drop(permit);
                    send_frame(
                        &tx,
                        &ServerFrame::Ack {
                            message_id,
                            outcome,
                        },
                    );
                });
            }
        });
    }

    while let Some(next) = ws_receiver.next().await {
        let msg = match next {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Connection error on {client_id}: {e}");
                break;
            }
        };
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else {
            continue;
        };

        match serde_json::from_str::<ClientFrame>(text) {
            Ok(ClientFrame::Subscribe { route }) => {
                lock(&hub).subscribe(&route, client_id.clone());
                debug!("{client_id} subscribed to {route}");
            }
            Ok(ClientFrame::Unsubscribe { route }) => {
                lock(&hub).unsubscribe(&route, &client_id);
                debug!("{client_id} unsubscribed from {route}");
            }
            Ok(ClientFrame::Send {
                route,
                payload,
                properties,
                message_id,
            }) => {
                let message_id = message_id.unwrap_or_else(|| Uuid::new_v4().to_string());
                let handler = lock(&hub).input_handler(&route);
                let Some(handler) = handler else {
                    send_frame(
                        &tx,
                        &ServerFrame::Error {
                            message: format!("no input handler on route '{route}'"),
                        },
                    );
                    continue;
                };

                let pending = PendingDispatch {
                    handler,
                    message: Message::with_properties(payload, properties),
                    message_id,
                };
                if dispatch_tx.send(pending).await.is_err() {
                    error!("Dispatcher for {client_id} stopped");
                    break;
                }
            }
            Ok(ClientFrame::Desired { properties }) => {
                let handlers = lock(&hub).config_handlers();
                for handler in handlers {
                    handler.on_desired_properties(&properties);
                }
            }
            Err(err) => {
                warn!(
                    "Invalid frame from {client_id}: {err} | {}",
                    &text.chars().take(100).collect::<String>()
                );
                send_frame(
                    &tx,
                    &ServerFrame::Error {
                        message: format!("invalid frame: {err}"),
                    },
                );
            }
        }
    }

    do_cleanup();
    info!("Connection closed: {client_id}");
}

/// Run an input handler on its own task.
///
/// A panic inside the handler surfaces as a `JoinError` here and is turned
/// into an abandoned acknowledgment, so one faulty message never takes down
/// the connection.
pub async fn dispatch(handler: Arc<dyn InputHandler>, message: Message) -> AckDecision {
    match spawn(async move { handler.handle(message).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let err = FilterError::Unexpected(e.to_string());
            error!("Input handler failed: {err}");
            err.ack()
        }
    }
}

fn send_frame(tx: &UnboundedSender<WsMessage>, frame: &ServerFrame) {
    match serde_json::to_string(frame) {
        Ok(text) => {
            if tx.send(WsMessage::text(text)).is_err() {
                debug!("Peer went away before frame could be queued");
            }
        }
        Err(e) => error!("Failed to serialize frame: {e}"),
    }
}
