//! Owner of the one canvas state a server process holds.
//!
//! The store is a plain value: it does not lock and it does not broadcast.
//! The sync layer keeps it next to the connection registry behind a single
//! lock so that a replacement and the fan-out that announces it happen as
//! one step.

use crate::state::current_timestamp;
use crate::StateDocument;

/// Holds the authoritative canvas as a [`StateDocument`].
///
/// # Example
///
/// ```
/// use overlay_core::{CanvasStore, StateDocument};
///
/// let mut store = CanvasStore::new();
/// assert!(store.read().is_empty());
///
/// let sent = r#"{"version":7,"elements":[{"id":"img1","type":"image","url":"/a.png"}]}"#;
/// store.replace(StateDocument::parse(sent).unwrap());
/// assert_eq!(store.version(), Some(7));
/// assert_eq!(store.read().as_str(), sent);
/// ```
#[derive(Debug, Clone)]
pub struct CanvasStore {
    state: StateDocument,
    replacements: u64,
}

impl CanvasStore {
    /// Create a store with no elements, versioned at the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(StateDocument::empty(current_timestamp()))
    }

    /// Create a store seeded with an initial state.
    #[must_use]
    pub fn with_state(state: StateDocument) -> Self {
        Self {
            state,
            replacements: 0,
        }
    }

    /// Overwrite the stored state and return the one it replaced.
    ///
    /// The incoming version is not compared with the stored one: whatever
    /// arrives last wins.
    pub fn replace(&mut self, state: StateDocument) -> StateDocument {
        self.replacements += 1;
        tracing::debug!(
            version = state.version(),
            previous_version = self.state.version(),
            elements = state.len(),
            "Canvas state replaced"
        );
        std::mem::replace(&mut self.state, state)
    }

    /// Return a copy of the current state.
    #[must_use]
    pub fn read(&self) -> StateDocument {
        self.state.clone()
    }

    /// Version marker of the current state, when it is an unsigned integer.
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        self.state.version()
    }

    /// Number of elements in the current state.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.state.len()
    }

    /// Number of replacements applied since the store was created.
    #[must_use]
    pub fn replacements(&self) -> u64 {
        self.replacements
    }
}

impl Default for CanvasStore {
    fn default() -> Self {
        Self::new()
    }
}
