//! Prometheus metrics for the overlay canvas server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.
//! The recording functions are no-ops until [`init_metrics`] installs a
//! recorder, so library code and tests can call them freely.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::registry::Role;

// Metric names as constants for consistency
const WS_CONNECTIONS_ACTIVE: &str = "overlay_ws_connections_active";
const WS_MESSAGES_TOTAL: &str = "overlay_ws_messages_total";
const STATE_REPLACEMENTS_TOTAL: &str = "overlay_state_replacements_total";
const CANVAS_ELEMENTS: &str = "overlay_canvas_elements";
const MALFORMED_FRAMES_TOTAL: &str = "overlay_malformed_frames_total";
const SKIPPED_DELIVERIES_TOTAL: &str = "overlay_skipped_deliveries_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Increment active WebSocket connections for a role.
pub fn inc_ws_connections(role: Role) {
    gauge!(WS_CONNECTIONS_ACTIVE, "role" => role.as_str()).increment(1.0);
}

/// Decrement active WebSocket connections for a role.
pub fn dec_ws_connections(role: Role) {
    gauge!(WS_CONNECTIONS_ACTIVE, "role" => role.as_str()).decrement(1.0);
}

/// Record a WebSocket message.
///
/// # Arguments
///
/// * `direction` - "inbound" or "outbound"
/// * `kind` - Envelope kind (e.g., "replace-state", "snapshot")
pub fn record_ws_message(direction: &str, kind: &str) {
    counter!(
        WS_MESSAGES_TOTAL,
        "direction" => direction.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record an accepted `replace-state` and the resulting canvas size.
pub fn record_replace(element_count: usize) {
    counter!(STATE_REPLACEMENTS_TOTAL).increment(1);
    set_canvas_elements(element_count);
}

/// Update canvas element count.
#[allow(clippy::cast_precision_loss)]
pub fn set_canvas_elements(count: usize) {
    gauge!(CANVAS_ELEMENTS).set(count as f64);
}

/// Record a dropped inbound frame.
///
/// # Arguments
///
/// * `reason` - Why it was dropped ("parse", "shape", "validation", "size")
pub fn record_malformed(reason: &'static str) {
    counter!(MALFORMED_FRAMES_TOTAL, "reason" => reason).increment(1);
}

/// Record connections that matched a broadcast but could not take the frame.
pub fn record_skipped_delivery(count: usize) {
    counter!(SKIPPED_DELIVERIES_TOTAL).increment(count as u64);
}
