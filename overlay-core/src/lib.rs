//! # Overlay Canvas Core
//!
//! Shared model for the overlay canvas: the element types, the single canvas
//! document (typed, and as relayed JSON text), the store that owns it on the
//! server, the JSON envelope spoken on the real-time channel, and the
//! editor-side producer with its gesture throttle.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────── editor (producer) ────────────────┐
//! │ GestureEvent ─► UpdateThrottle ─► Producer::emit  │
//! └───────────────────────┬───────────────────────────┘
//!                         │ replace-state (Envelope)
//! ┌───────────────────────▼───────────────────────────┐
//! │ server: CanvasStore::replace ─► fan-out snapshot  │
//! └───────────────────────┬───────────────────────────┘
//!                         │ snapshot (Envelope)
//!                  overlays (consumers)
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod element;
pub mod error;
pub mod message;
pub mod producer;
pub mod state;
pub mod store;
pub mod throttle;

pub use document::StateDocument;
pub use element::{Element, ElementKind, Position, Size, TextAlign, TextStyle, VideoProps};
pub use error::{CanvasError, CanvasResult};
pub use message::{Envelope, MessageKind};
pub use producer::{Gesture, GestureEvent, Producer};
pub use state::{current_timestamp, CanvasState};
pub use store::CanvasStore;
pub use throttle::{UpdateThrottle, THROTTLE_WINDOW};

/// Canvas core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
