//! # Overlay Canvas Server Library
//!
//! Real-time sync server for the overlay canvas. Editors (producers) push
//! whole canvas states over a WebSocket; the server keeps the latest one and
//! fans it out to every other connected client. This library is used by
//! both the binary and integration tests.

use std::sync::Arc;

pub mod broadcast;
pub mod config;
pub mod health;
pub mod metrics;
pub mod registry;
pub mod routes;
pub mod session;
pub mod sync;
pub mod validation;

pub use config::{CliArgs, Mode, ServerConfig};
pub use registry::Role;
pub use routes::router;
pub use sync::{SyncError, SyncState};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Canvas store and connected clients.
    pub sync: SyncState,
    /// Resolved configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create application state around a fresh canvas.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            sync: SyncState::new(),
            config: Arc::new(config),
        }
    }

    /// Get a reference to the sync state.
    pub fn sync(&self) -> &SyncState {
        &self.sync
    }
}
