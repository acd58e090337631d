//! Shared helpers for integration tests.

#![allow(dead_code)]

mod server;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use overlay_core::{CanvasState, Envelope, MessageKind, StateDocument};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};

pub use server::TestServer;

/// Client side of one WebSocket connection.
pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connect and panic on failure.
pub async fn connect(url: &str) -> Client {
    let (ws, _) = connect_async(url).await.expect("failed to connect");
    ws
}

/// Receive the next envelope, skipping non-text frames.
pub async fn recv_envelope(ws: &mut Client) -> Option<Envelope> {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next()).await.ok()??.ok()?;
        match msg {
            Message::Text(text) => return Envelope::decode(&text).ok(),
            Message::Close(_) => return None,
            _ => {}
        }
    }
}

/// Receive the next snapshot and return its state.
pub async fn recv_snapshot(ws: &mut Client) -> CanvasState {
    let envelope = recv_envelope(ws).await.expect("expected a frame");
    assert_eq!(envelope.kind, MessageKind::Snapshot);
    envelope.state_payload().expect("snapshot carries state")
}

/// Receive the next snapshot and return its `data` text untouched.
pub async fn recv_snapshot_text(ws: &mut Client) -> String {
    let envelope = recv_envelope(ws).await.expect("expected a frame");
    assert_eq!(envelope.kind, MessageKind::Snapshot);
    envelope.data.expect("snapshot carries state").get().to_string()
}

/// `state` as the document the server stores after `send_replace`.
pub fn document(state: &CanvasState) -> StateDocument {
    StateDocument::from_state(state).expect("should encode")
}

/// Assert nothing arrives within `wait`.
pub async fn assert_silent(ws: &mut Client, wait: Duration) {
    if let Ok(Some(Ok(Message::Text(text)))) = timeout(wait, ws.next()).await {
        panic!("unexpected frame: {text}");
    }
}

/// Send a raw text frame.
pub async fn send_text(ws: &mut Client, text: &str) {
    ws.send(Message::Text(text.to_string()))
        .await
        .expect("send failed");
}

/// Send `replace-state` carrying `state`.
pub async fn send_replace(ws: &mut Client, state: &CanvasState) {
    let text = Envelope::replace_state(state)
        .and_then(|e| e.encode())
        .expect("should encode");
    send_text(ws, &text).await;
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
