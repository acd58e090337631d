//! Producer-side rate limiting for continuous gestures.
//!
//! Dragging or resizing an element produces pointer events far faster than
//! the channel needs. [`UpdateThrottle`] admits at most one intermediate event
//! per window and always admits the final event of a gesture, so the last
//! frame of an interaction is never lost.

use std::time::{Duration, Instant};

/// Minimum spacing between two admitted intermediate events.
pub const THROTTLE_WINDOW: Duration = Duration::from_millis(30);

/// Time-window gate for a stream of gesture events.
#[derive(Debug, Clone)]
pub struct UpdateThrottle {
    window: Duration,
    last_sent_at: Option<Instant>,
    admitted: u64,
    dropped: u64,
}

impl UpdateThrottle {
    /// Create a gate with the default 30ms window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(THROTTLE_WINDOW)
    }

    /// Create a gate with a custom window.
    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            last_sent_at: None,
            admitted: 0,
            dropped: 0,
        }
    }

    /// Decide whether the event observed at `now` should be sent.
    ///
    /// Final events always pass. Intermediate events pass only when at least
    /// one window has elapsed since the last admitted event. Admitting an
    /// event restarts the window.
    pub fn admit(&mut self, now: Instant, is_final: bool) -> bool {
        if !is_final {
            if let Some(last) = self.last_sent_at {
                if now.saturating_duration_since(last) < self.window {
                    self.dropped += 1;
                    return false;
                }
            }
        }
        self.last_sent_at = Some(now);
        self.admitted += 1;
        true
    }

    /// The configured window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// When the last event was admitted.
    #[must_use]
    pub fn last_sent_at(&self) -> Option<Instant> {
        self.last_sent_at
    }

    /// Events admitted so far.
    #[must_use]
    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    /// Events dropped so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for UpdateThrottle {
    fn default() -> Self {
        Self::new()
    }
}
