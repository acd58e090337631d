//! Registry of live WebSocket connections.
//!
//! Each accepted socket gets a [`Connection`] record and a bounded outbound
//! queue. The session task drains the queue into the socket; everybody else
//! writes to a connection only by pushing onto that queue, and a queue that
//! is full is skipped rather than grown.

use std::collections::HashMap;

use axum::extract::ws::Utf8Bytes;
use overlay_core::current_timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Outbound frame queue of one connection.
pub type Outbound = mpsc::Sender<Utf8Bytes>;

/// Frames a connection may have waiting before broadcasts start skipping it.
pub const OUTBOUND_CAPACITY: usize = 100;

/// Create the outbound queue for one connection.
#[must_use]
pub fn outbound_queue() -> (Outbound, mpsc::Receiver<Utf8Bytes>) {
    mpsc::channel(OUTBOUND_CAPACITY)
}

/// Length of generated connection identifiers.
const CONNECTION_ID_LEN: usize = 8;

/// Which side of the canvas a client is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Editor that mutates the canvas.
    Producer,
    /// Overlay/output that renders the canvas.
    #[default]
    Consumer,
}

impl Role {
    /// Label used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Producer => "producer",
            Self::Consumer => "consumer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Accepted; the connect-time snapshot has not been queued yet.
    Connecting,
    /// Snapshot queued; receives broadcasts.
    Open,
    /// Terminal.
    Closed,
}

/// What the server knows about one connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    /// Short random token, for logs only.
    pub id: String,
    /// Negotiated at handshake.
    pub role: Role,
    /// Reserved for channel-level authentication; never set by the server.
    pub authenticated: bool,
    /// Accept time, Unix milliseconds.
    pub connected_at: u64,
    /// Current lifecycle state.
    pub state: ConnectionState,
}

#[derive(Debug)]
struct Entry {
    connection: Connection,
    outbound: Outbound,
}

impl Connection {
    /// Whether a frame queued now would reach this connection's socket task.
    #[must_use]
    pub fn can_receive(&self, outbound: &Outbound) -> bool {
        self.state == ConnectionState::Open && !outbound.is_closed()
    }
}

/// All live connections keyed by identifier.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: HashMap<String, Entry>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly accepted connection in the `Connecting` state.
    pub fn register(&mut self, outbound: Outbound, role: Role) -> Connection {
        let id = self.fresh_id();
        let connection = Connection {
            id: id.clone(),
            role,
            authenticated: false,
            connected_at: current_timestamp(),
            state: ConnectionState::Connecting,
        };
        tracing::info!(connection_id = %id, %role, "Connection registered");
        self.entries.insert(
            id,
            Entry {
                connection: connection.clone(),
                outbound,
            },
        );
        connection
    }

    /// Move a connection to `Open`. Returns false if it is not registered.
    pub fn mark_open(&mut self, id: &str) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.connection.state = ConnectionState::Open;
                true
            }
            None => false,
        }
    }

    /// Remove a connection.
    ///
    /// Removing an unknown or already removed connection is a no-op and
    /// returns `None`.
    pub fn unregister(&mut self, id: &str) -> Option<Connection> {
        let mut entry = self.entries.remove(id)?;
        entry.connection.state = ConnectionState::Closed;
        tracing::info!(
            connection_id = %id,
            role = %entry.connection.role,
            "Connection unregistered"
        );
        Some(entry.connection)
    }

    /// Look up a connection.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Connection> {
        self.entries.get(id).map(|e| &e.connection)
    }

    /// Live connections with the given role and their outbound queues.
    pub fn by_role(&self, role: Role) -> impl Iterator<Item = (&Connection, &Outbound)> + '_ {
        self.iter().filter(move |(c, _)| c.role == role)
    }

    /// All live connections and their outbound queues.
    pub fn iter(&self) -> impl Iterator<Item = (&Connection, &Outbound)> + '_ {
        self.entries.values().map(|e| (&e.connection, &e.outbound))
    }

    /// Number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of registered connections with the given role.
    #[must_use]
    pub fn count_by_role(&self, role: Role) -> usize {
        self.by_role(role).count()
    }

    fn fresh_id(&self) -> String {
        loop {
            let mut id = Uuid::new_v4().simple().to_string();
            id.truncate(CONNECTION_ID_LEN);
            if !self.entries.contains_key(&id) {
                return id;
            }
        }
    }
}
