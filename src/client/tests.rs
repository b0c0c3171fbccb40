use super::hub_client::Client;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

#[test]
fn test_client_new() {
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    assert!(!client.id.is_empty());
}

#[test]
fn test_clients_get_distinct_ids() {
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let a = Client::new(tx.clone());
    let b = Client::new(tx);
    assert_ne!(a.id, b.id);
}
