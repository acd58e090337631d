//! Fan-out of outbound envelopes.
//!
//! The router encodes a message once and pushes the same frame onto the
//! queue of every matching writable connection. Delivery is at most once and
//! fire-and-forget: connections that are not open, or whose queue already
//! holds [`OUTBOUND_CAPACITY`](crate::registry::OUTBOUND_CAPACITY) frames,
//! are skipped and nothing is retried.

use axum::extract::ws::Utf8Bytes;
use overlay_core::{CanvasResult, Envelope};
use tokio::sync::mpsc::error::TrySendError;

use crate::metrics::{record_skipped_delivery, record_ws_message};
use crate::registry::{Connection, ConnectionRegistry, Role};

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Connections the frame was queued for.
    pub delivered: usize,
    /// Matching connections that could not take the frame.
    pub skipped: usize,
}

/// Borrowing view over a registry that sends to subsets of it.
pub struct BroadcastRouter<'a> {
    registry: &'a ConnectionRegistry,
}

impl<'a> BroadcastRouter<'a> {
    /// Route over the given registry.
    #[must_use]
    pub fn new(registry: &'a ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Send to every writable connection for which `predicate` holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope cannot be encoded; nothing is sent.
    pub fn send<P>(&self, envelope: &Envelope, predicate: P) -> CanvasResult<Delivery>
    where
        P: Fn(&Connection) -> bool,
    {
        let frame = Utf8Bytes::from(envelope.encode()?);
        let mut delivery = Delivery::default();

        for (connection, outbound) in self.registry.iter() {
            if !predicate(connection) {
                continue;
            }
            if !connection.can_receive(outbound) {
                delivery.skipped += 1;
                continue;
            }
            match outbound.try_send(frame.clone()) {
                Ok(()) => delivery.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection_id = %connection.id,
                        kind = %envelope.kind,
                        "Outbound queue full; skipping frame"
                    );
                    delivery.skipped += 1;
                }
                Err(TrySendError::Closed(_)) => delivery.skipped += 1,
            }
        }

        if delivery.skipped > 0 {
            record_skipped_delivery(delivery.skipped);
        }
        record_ws_message("outbound", envelope.kind.as_str());
        tracing::trace!(
            kind = %envelope.kind,
            delivered = delivery.delivered,
            skipped = delivery.skipped,
            "Broadcast"
        );
        Ok(delivery)
    }

    /// Send to every writable connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope cannot be encoded.
    pub fn send_to_all(&self, envelope: &Envelope) -> CanvasResult<Delivery> {
        self.send(envelope, |_| true)
    }

    /// Send to every writable connection with the given role.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope cannot be encoded.
    pub fn send_to_role(&self, envelope: &Envelope, role: Role) -> CanvasResult<Delivery> {
        self.send(envelope, |c| c.role == role)
    }

    /// Send to every writable connection except `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope cannot be encoded.
    pub fn send_to_others(&self, envelope: &Envelope, origin: &str) -> CanvasResult<Delivery> {
        self.send(envelope, |c| c.id != origin)
    }

    /// Send to a single connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope cannot be encoded.
    pub fn send_to(&self, envelope: &Envelope, id: &str) -> CanvasResult<Delivery> {
        self.send(envelope, |c| c.id == id)
    }
}
