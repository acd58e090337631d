//! Shared canvas state and its connected clients.
//!
//! [`SyncState`] keeps the [`CanvasStore`] and the [`ConnectionRegistry`]
//! behind one mutex. Every operation that touches either runs as a single
//! critical section that never awaits, so a replacement and the fan-out of
//! the new snapshot are observed by every client in the same order, and a
//! freshly opened connection gets its snapshot before any later broadcast.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use overlay_core::{CanvasError, CanvasStore, Envelope, StateDocument};

use crate::broadcast::{BroadcastRouter, Delivery};
use crate::metrics::record_replace;
use crate::registry::{Connection, ConnectionRegistry, Outbound, Role};
use crate::validation::{validate_state, ValidationError};

/// Errors that can occur during sync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No connection is registered under this id.
    #[error("Unknown connection: {0}")]
    UnknownConnection(String),
    /// The incoming state failed structural validation.
    #[error("Invalid state: {0}")]
    Invalid(#[from] ValidationError),
    /// Envelope encoding failed.
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

#[derive(Debug, Default)]
struct Hub {
    store: CanvasStore,
    registry: ConnectionRegistry,
}

/// Shared state for WebSocket synchronization.
#[derive(Clone, Default)]
pub struct SyncState {
    hub: Arc<Mutex<Hub>>,
}

impl SyncState {
    /// Create a sync state around an empty canvas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sync state around an existing store.
    #[must_use]
    pub fn with_store(store: CanvasStore) -> Self {
        Self {
            hub: Arc::new(Mutex::new(Hub {
                store,
                registry: ConnectionRegistry::new(),
            })),
        }
    }

    fn hub(&self) -> MutexGuard<'_, Hub> {
        self.hub.lock().unwrap_or_else(|e: PoisonError<_>| {
            tracing::error!("Sync state lock poisoned; continuing with inner state");
            e.into_inner()
        })
    }

    /// Register a newly accepted connection.
    ///
    /// The connection starts out `Connecting` and receives nothing until
    /// [`SyncState::open`] is called for it.
    pub fn connect(&self, outbound: Outbound, role: Role) -> Connection {
        self.hub().registry.register(outbound, role)
    }

    /// Open a connection and queue the current snapshot to it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownConnection`] if `id` is not registered.
    pub fn open(&self, id: &str) -> Result<Delivery, SyncError> {
        let mut hub = self.hub();
        let snapshot = Envelope::snapshot(&hub.store.read())?;
        if !hub.registry.mark_open(id) {
            return Err(SyncError::UnknownConnection(id.to_string()));
        }
        let delivery = BroadcastRouter::new(&hub.registry).send_to(&snapshot, id)?;
        tracing::debug!(
            connection_id = %id,
            version = hub.store.version(),
            elements = hub.store.element_count(),
            "Initial snapshot queued"
        );
        Ok(delivery)
    }

    /// Replace the canvas with `state` and fan it out to everyone but `origin`.
    ///
    /// The document is stored and relayed as sent. The version is not
    /// compared with the stored one: the last state received wins.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Invalid`] if the state fails validation; the store
    /// is left untouched and nothing is sent.
    pub fn replace_state(
        &self,
        origin: &str,
        state: StateDocument,
    ) -> Result<Delivery, SyncError> {
        validate_state(&state)?;
        let snapshot = Envelope::snapshot(&state)?;
        let element_count = state.len();

        let mut hub = self.hub();
        hub.store.replace(state);
        let delivery = BroadcastRouter::new(&hub.registry).send_to_others(&snapshot, origin)?;
        drop(hub);

        record_replace(element_count);
        Ok(delivery)
    }

    /// Remove a connection. Unknown ids are a no-op.
    pub fn disconnect(&self, id: &str) -> Option<Connection> {
        self.hub().registry.unregister(id)
    }

    /// Copy of the current canvas.
    #[must_use]
    pub fn snapshot(&self) -> StateDocument {
        self.hub().store.read()
    }

    /// Look up a connection.
    #[must_use]
    pub fn connection(&self, id: &str) -> Option<Connection> {
        self.hub().registry.get(id).cloned()
    }

    /// Number of registered connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.hub().registry.len()
    }

    /// Number of registered connections with the given role.
    #[must_use]
    pub fn count_by_role(&self, role: Role) -> usize {
        self.hub().registry.count_by_role(role)
    }
}
