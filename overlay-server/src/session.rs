//! Per-connection WebSocket session.
//!
//! A session registers its connection, opens it (which queues the initial
//! snapshot), then runs one `select!` loop that feeds inbound text frames to
//! [`dispatch_frame`] and drains the outbound queue into the socket. Any
//! close or transport error ends the loop and unregisters the connection.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use overlay_core::{Envelope, MessageKind};

use crate::metrics::{dec_ws_connections, inc_ws_connections, record_malformed, record_ws_message};
use crate::registry::{outbound_queue, Role};
use crate::sync::{SyncError, SyncState};
use crate::validation::validate_message_size;

/// What happened to one inbound text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The canvas was replaced and the new snapshot fanned out.
    Replaced {
        /// Connections the snapshot was queued for.
        delivered: usize,
        /// Elements in the new canvas.
        elements: usize,
    },
    /// A recognised kind this server takes no action on.
    Unhandled(MessageKind),
    /// A kind this server does not know.
    Unknown,
    /// The frame was dropped.
    Rejected {
        /// Short machine-readable cause.
        reason: &'static str,
        /// Human-readable detail.
        detail: String,
    },
}

fn reject(origin: &str, reason: &'static str, detail: impl ToString) -> FrameOutcome {
    let detail = detail.to_string();
    tracing::warn!(connection_id = %origin, reason, error = %detail, "Dropping malformed frame");
    record_malformed(reason);
    FrameOutcome::Rejected { reason, detail }
}

/// Apply one inbound text frame from connection `origin`.
///
/// Never fails: whatever the frame contains, the connection stays usable.
pub fn dispatch_frame(state: &SyncState, origin: &str, text: &str) -> FrameOutcome {
    if let Err(e) = validate_message_size(text.len()) {
        return reject(origin, "size", e);
    }
    let envelope = match Envelope::decode(text) {
        Ok(envelope) => envelope,
        Err(e) => return reject(origin, "parse", e),
    };
    record_ws_message("inbound", envelope.kind.as_str());

    match envelope.kind {
        MessageKind::ReplaceState => {
            let next = match envelope.document() {
                Ok(next) => next,
                Err(e) => return reject(origin, "shape", e),
            };
            let elements = next.len();
            let version = next.version();
            match state.replace_state(origin, next) {
                Ok(delivery) => {
                    tracing::debug!(
                        connection_id = %origin,
                        version,
                        elements,
                        delivered = delivery.delivered,
                        "State replaced"
                    );
                    FrameOutcome::Replaced {
                        delivered: delivery.delivered,
                        elements,
                    }
                }
                Err(SyncError::Invalid(e)) => reject(origin, "validation", e),
                Err(e) => reject(origin, "shape", e),
            }
        }
        MessageKind::Unknown => {
            tracing::debug!(connection_id = %origin, "Ignoring unknown message kind");
            FrameOutcome::Unknown
        }
        kind => {
            tracing::debug!(
                connection_id = %origin,
                %kind,
                request_id = envelope.request_id.as_deref(),
                "Unhandled message kind"
            );
            FrameOutcome::Unhandled(kind)
        }
    }
}

/// Drive one WebSocket connection until it closes.
#[tracing::instrument(name = "ws_session", skip(socket, state))]
pub async fn handle_socket(socket: WebSocket, state: SyncState, role: Role) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound, mut queue) = outbound_queue();

    let connection_id = state.connect(outbound, role).id;
    inc_ws_connections(role);

    if let Err(e) = state.open(&connection_id) {
        tracing::error!(connection_id = %connection_id, "Failed to open connection: {}", e);
        state.disconnect(&connection_id);
        dec_ws_connections(role);
        return;
    }

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        dispatch_frame(&state, &connection_id, text.as_str());
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::debug!(connection_id = %connection_id, "Ignoring binary frame");
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!(connection_id = %connection_id, "Client closed connection");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(connection_id = %connection_id, "WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                    // Ping/pong are answered by the transport.
                    _ => {}
                }
            }

            frame = queue.recv() => {
                match frame {
                    Some(frame) => {
                        if sender.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    state.disconnect(&connection_id);
    dec_ws_connections(role);
    tracing::info!(connection_id = %connection_id, %role, "WebSocket session closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::Utf8Bytes;
    use overlay_core::{CanvasState, Element, StateDocument};
    use tokio::sync::mpsc;

    fn open(state: &SyncState, role: Role) -> (String, mpsc::Receiver<Utf8Bytes>) {
        let (tx, mut rx) = outbound_queue();
        let id = state.connect(tx, role).id;
        state.open(&id).expect("should open");
        // Discard the connect-time snapshot.
        rx.try_recv().expect("initial snapshot");
        (id, rx)
    }

    fn replace_frame(state: &CanvasState) -> String {
        Envelope::replace_state(state)
            .and_then(|e| e.encode())
            .expect("should encode")
    }

    #[test]
    fn test_replace_state_frame() {
        let sync = SyncState::new();
        let (producer, _p) = open(&sync, Role::Producer);
        let (_overlay, mut overlay_rx) = open(&sync, Role::Consumer);

        let next = CanvasState::with_elements(9, vec![Element::image("img1", "/a.png")]);
        let outcome = dispatch_frame(&sync, &producer, &replace_frame(&next));

        assert_eq!(
            outcome,
            FrameOutcome::Replaced {
                delivered: 1,
                elements: 1
            }
        );
        assert_eq!(sync.snapshot().to_state().expect("typed view"), next);
        let frame = overlay_rx.try_recv().expect("overlay gets snapshot");
        let envelope = Envelope::decode(frame.as_str()).expect("should decode");
        assert_eq!(envelope.kind, MessageKind::Snapshot);
    }

    #[test]
    fn test_replace_frame_relayed_byte_for_byte() {
        let sync = SyncState::new();
        let (producer, _p) = open(&sync, Role::Producer);
        let (_overlay, mut overlay_rx) = open(&sync, Role::Consumer);

        let data = concat!(
            r#"{"elements":[{"url":"/clip.mp4","type":"video","id":"v1","#,
            r#""videoProps":{"volume":0.25},"zIndex":3.5,"label":"intro"}]}"#
        );
        let frame = format!(r#"{{"kind":"replace-state","data":{data},"requestId":"r1"}}"#);
        assert!(matches!(
            dispatch_frame(&sync, &producer, &frame),
            FrameOutcome::Replaced { delivered: 1, elements: 1 }
        ));

        let relayed = overlay_rx.try_recv().expect("overlay gets snapshot");
        assert_eq!(
            relayed.as_str(),
            format!(r#"{{"kind":"snapshot","data":{data}}}"#)
        );
        assert_eq!(sync.snapshot(), StateDocument::parse(data).expect("should parse"));
    }

    #[test]
    fn test_other_kinds_do_not_mutate() {
        let sync = SyncState::new();
        let (producer, _p) = open(&sync, Role::Producer);
        let before = sync.snapshot();

        for kind in [
            "authenticate",
            "heartbeat-ping",
            "heartbeat-pong",
            "add-element",
            "remove-element",
            "update-property",
            "clear-all",
        ] {
            let frame = format!(r#"{{"kind":"{kind}","data":{{"version":1,"elements":[]}}}}"#);
            let outcome = dispatch_frame(&sync, &producer, &frame);
            assert!(
                matches!(outcome, FrameOutcome::Unhandled(k) if k.as_str() == kind),
                "{kind} should be unhandled"
            );
        }
        assert_eq!(sync.snapshot(), before);
    }

    #[test]
    fn test_unknown_kind_ignored() {
        let sync = SyncState::new();
        let (producer, _p) = open(&sync, Role::Producer);
        assert_eq!(
            dispatch_frame(&sync, &producer, r#"{"kind":"teleport"}"#),
            FrameOutcome::Unknown
        );
    }

    #[test]
    fn test_malformed_frames_rejected() {
        let sync = SyncState::new();
        let (producer, _p) = open(&sync, Role::Producer);
        let (_overlay, mut overlay_rx) = open(&sync, Role::Consumer);
        let before = sync.snapshot();

        let cases = [
            ("not json", "parse"),
            (r#"{"data":{}}"#, "parse"),
            (r#"{"kind":"replace-state"}"#, "shape"),
            (r#"{"kind":"replace-state","data":{"elements":"nope"}}"#, "shape"),
            (r#"{"kind":"replace-state","data":{"version":1}}"#, "shape"),
            (r#"{"kind":"replace-state","data":[1,[]]}"#, "shape"),
            (
                r#"{"kind":"replace-state","data":{"elements":[{"id":"","type":"image"}]}}"#,
                "validation",
            ),
            (
                r#"{"kind":"replace-state","data":{"elements":[{"type":"image"}]}}"#,
                "validation",
            ),
        ];
        for (frame, expected) in cases {
            match dispatch_frame(&sync, &producer, frame) {
                FrameOutcome::Rejected { reason, .. } => assert_eq!(reason, expected, "{frame}"),
                other => panic!("expected rejection for {frame}, got {other:?}"),
            }
        }

        assert_eq!(sync.snapshot(), before);
        assert!(overlay_rx.try_recv().is_err());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let sync = SyncState::new();
        let (producer, _p) = open(&sync, Role::Producer);
        let frame = "x".repeat(crate::validation::MAX_WS_MESSAGE_SIZE + 1);
        assert!(matches!(
            dispatch_frame(&sync, &producer, &frame),
            FrameOutcome::Rejected { reason: "size", .. }
        ));
    }
}
