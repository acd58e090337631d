//! Health check endpoints.
//!
//! - `/health/live` - Liveness probe (restart if fails)
//! - `/health` - Service status with connection counts

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use overlay_core::current_timestamp;

use crate::config::Mode;
use crate::registry::Role;
use crate::AppState;

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "overlay-canvas";

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Always "ok" while the process answers.
    pub status: &'static str,
    /// Unix milliseconds at which the check ran.
    pub timestamp: u64,
    /// Service name.
    pub service: &'static str,
    /// Deployment mode.
    pub mode: Mode,
    /// Server version
    pub version: &'static str,
    /// Open connections by role.
    pub connections: ConnectionCounts,
}

/// Connection counts by role.
#[derive(Debug, Serialize)]
pub struct ConnectionCounts {
    /// Editors.
    pub producers: usize,
    /// Overlays.
    pub consumers: usize,
}

/// Liveness probe - is the server running?
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Service status.
#[tracing::instrument(name = "health_check", skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        timestamp: current_timestamp(),
        service: SERVICE_NAME,
        mode: state.config.mode,
        version: env!("CARGO_PKG_VERSION"),
        connections: ConnectionCounts {
            producers: state.sync.count_by_role(Role::Producer),
            consumers: state.sync.count_by_role(Role::Consumer),
        },
    })
}
