//! The canvas document as it travels between clients.
//!
//! A relay never re-encodes the state it was sent. [`StateDocument`] keeps
//! the JSON text of a `data` payload untouched, so a snapshot carries the
//! producer's bytes: fields the server does not model, numbers of any shape
//! and the sender's key order all survive. [`CanvasState`] is the typed view
//! for code that wants to look inside.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::{CanvasError, CanvasResult, CanvasState};

/// A canvas state held as the JSON text it arrived in.
///
/// The only structure required is an object with an `elements` array.
/// `version` is read for logging when it is an unsigned integer and carried
/// along otherwise.
///
/// ```
/// use overlay_core::StateDocument;
///
/// let text = r#"{"elements":[{"type":"text","id":"t1","zIndex":1.5}]}"#;
/// let document = StateDocument::parse(text).unwrap();
/// assert_eq!(document.as_str(), text);
/// assert_eq!(document.version(), None);
/// assert_eq!(document.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDocument {
    json: String,
    version: Option<u64>,
    element_count: usize,
}

#[derive(Deserialize)]
struct Outline {
    #[serde(default)]
    version: Option<Value>,
    elements: Vec<IgnoredAny>,
}

impl StateDocument {
    /// An empty canvas at `version`.
    #[must_use]
    pub fn empty(version: u64) -> Self {
        Self {
            json: format!(r#"{{"version":{version},"elements":[]}}"#),
            version: Some(version),
            element_count: 0,
        }
    }

    /// Take ownership of a JSON state document.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidMessage`] if `json` is not an object and
    /// [`CanvasError::Serialization`] if it has no `elements` array.
    pub fn parse(json: impl Into<String>) -> CanvasResult<Self> {
        let json = json.into();
        if !json.trim_start().starts_with('{') {
            return Err(CanvasError::InvalidMessage(
                "state document is not a JSON object".to_string(),
            ));
        }
        let outline: Outline = serde_json::from_str(&json)?;
        Ok(Self {
            version: outline.version.as_ref().and_then(Value::as_u64),
            element_count: outline.elements.len(),
            json,
        })
    }

    /// Encode a typed state.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`] if encoding fails.
    pub fn from_state(state: &CanvasState) -> CanvasResult<Self> {
        Self::parse(serde_json::to_string(state)?)
    }

    /// The document text, exactly as received.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.json
    }

    /// The sender's version marker, when it is an unsigned integer.
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.element_count
    }

    /// Whether the canvas has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    /// Decode into the typed model, filling defaults for omitted fields.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`] if the elements do not fit the
    /// typed model.
    pub fn to_state(&self) -> CanvasResult<CanvasState> {
        Ok(serde_json::from_str(&self.json)?)
    }

    /// Copy the text into a raw JSON value for embedding in an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`] if the text is not JSON, which
    /// a parsed document never is.
    pub fn to_raw(&self) -> CanvasResult<Box<RawValue>> {
        RawValue::from_string(self.json.clone()).map_err(CanvasError::from)
    }
}

impl Serialize for StateDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw: &RawValue = serde_json::from_str(&self.json)
            .map_err(<S::Error as serde::ser::Error>::custom)?;
        raw.serialize(serializer)
    }
}
