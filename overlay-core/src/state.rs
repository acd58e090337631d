//! The shared canvas document.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::Element;

/// The single authoritative document describing everything on screen.
///
/// `version` is stamped by whoever produced the state (milliseconds on the
/// producer's clock). Receivers carry it along but never compare it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    /// Version marker set by the sender.
    pub version: u64,
    /// Elements in the order the producer sent them.
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl CanvasState {
    /// Create an empty state with the given version.
    #[must_use]
    pub fn new(version: u64) -> Self {
        Self {
            version,
            elements: Vec::new(),
        }
    }

    /// Create a state from an element sequence.
    #[must_use]
    pub fn with_elements(version: u64, elements: Vec<Element>) -> Self {
        Self { version, elements }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the canvas has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Look up an element by ID.
    #[must_use]
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Return the first element ID that appears more than once, if any.
    #[must_use]
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.elements.len());
        self.elements
            .iter()
            .map(|e| e.id.as_str())
            .find(|id| !seen.insert(*id))
    }

    /// Elements sorted by paint order, lowest first.
    ///
    /// The sort is stable so elements sharing a `zIndex` keep sequence order.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        ordered.sort_by_key(|e| e.z_index);
        ordered
    }
}

/// Get the current Unix timestamp in milliseconds.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
