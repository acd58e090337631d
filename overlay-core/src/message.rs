//! # Wire Envelope
//!
//! Every frame on the real-time channel, in either direction, is one JSON
//! object:
//!
//! ```json
//! {"kind": "replace-state", "data": {"version": 1700000000000, "elements": []}, "requestId": "r1"}
//! ```
//!
//! `data` and `requestId` are optional. `data` is kept as the raw JSON text
//! it arrived in and only decoded on demand. Only two kinds have an effect:
//! `replace-state` (client -> server) and `snapshot` (server -> client). The
//! remaining kinds are reserved and accepted without effect.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::{CanvasError, CanvasResult, CanvasState, StateDocument};

/// Kind discriminator of an [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// Reserved: channel-level authentication.
    Authenticate,
    /// Reserved: application heartbeat request.
    HeartbeatPing,
    /// Reserved: application heartbeat reply.
    HeartbeatPong,
    /// Reserved: incremental element insert.
    AddElement,
    /// Reserved: incremental element removal.
    RemoveElement,
    /// Reserved: single property update.
    UpdateProperty,
    /// Reserved: remove every element.
    ClearAll,
    /// Overwrite the whole canvas state.
    ReplaceState,
    /// Full canvas state pushed by the server.
    Snapshot,
    /// Any kind this build does not know.
    #[serde(other)]
    Unknown,
}

impl MessageKind {
    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::HeartbeatPing => "heartbeat-ping",
            Self::HeartbeatPong => "heartbeat-pong",
            Self::AddElement => "add-element",
            Self::RemoveElement => "remove-element",
            Self::UpdateProperty => "update-property",
            Self::ClearAll => "clear-all",
            Self::ReplaceState => "replace-state",
            Self::Snapshot => "snapshot",
            Self::Unknown => "unknown",
        }
    }

    /// Whether messages of this kind change the canvas state.
    #[must_use]
    pub fn mutates_state(self) -> bool {
        matches!(self, Self::ReplaceState)
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message on the real-time channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// What the message is.
    pub kind: MessageKind,
    /// Kind-specific payload, undecoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Box<RawValue>>,
    /// Correlation token chosen by the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Envelope {
    /// Create an envelope without payload.
    #[must_use]
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            data: None,
            request_id: None,
        }
    }

    /// Build a `snapshot` envelope carrying the document text unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`] if the document is not JSON.
    pub fn snapshot(document: &StateDocument) -> CanvasResult<Self> {
        Ok(Self {
            kind: MessageKind::Snapshot,
            data: Some(document.to_raw()?),
            request_id: None,
        })
    }

    /// Build a `replace-state` envelope carrying the full state.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`] if the state cannot be encoded.
    pub fn replace_state(state: &CanvasState) -> CanvasResult<Self> {
        Ok(Self {
            kind: MessageKind::ReplaceState,
            data: Some(serde_json::value::to_raw_value(state)?),
            request_id: None,
        })
    }

    /// Attach a request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Parse one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`] if the frame is not JSON or
    /// lacks a string `kind`.
    pub fn decode(text: &str) -> CanvasResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode as one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`] if encoding fails.
    pub fn encode(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Interpret `data` as a full canvas state.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidMessage`] when `data` is absent and
    /// [`CanvasError::Serialization`] when it does not have the state shape.
    pub fn state_payload(&self) -> CanvasResult<CanvasState> {
        Ok(serde_json::from_str(self.payload()?.get())?)
    }

    /// Take `data` as a state document, keeping its text as sent.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidMessage`] when `data` is absent or not an
    /// object and [`CanvasError::Serialization`] when it has no `elements`
    /// array.
    pub fn document(&self) -> CanvasResult<StateDocument> {
        StateDocument::parse(self.payload()?.get())
    }

    fn payload(&self) -> CanvasResult<&RawValue> {
        self.data
            .as_deref()
            .ok_or_else(|| CanvasError::InvalidMessage(format!("{} without data", self.kind)))
    }
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.request_id == other.request_id
            && self.data.as_deref().map(RawValue::get) == other.data.as_deref().map(RawValue::get)
    }
}
