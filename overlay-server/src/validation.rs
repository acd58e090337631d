//! Input validation for untrusted data.
//!
//! Everything a client sends MUST be validated before it reaches the store.
//! Validation reads a state through a narrow view of the fields it checks.
//! It never rewrites the document, and everything outside the view,
//! `version` included, is taken as given.

use std::collections::HashSet;

use overlay_core::StateDocument;
use serde::Deserialize;
use thiserror::Error;

/// Maximum length for element IDs.
pub const MAX_ELEMENT_ID_LEN: usize = 128;
/// Maximum text content length in elements.
pub const MAX_TEXT_CONTENT_LEN: usize = 1_048_576; // 1MB
/// Maximum elements per canvas.
pub const MAX_ELEMENTS_PER_CANVAS: usize = 10_000;
/// Maximum WebSocket message size.
pub const MAX_WS_MESSAGE_SIZE: usize = 1_048_576; // 1MB

/// Validation error types.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Element ID is empty.
    #[error("element id is empty")]
    ElementIdEmpty,
    /// Element ID exceeds maximum length.
    #[error("element id too long (max {MAX_ELEMENT_ID_LEN} chars)")]
    ElementIdTooLong,
    /// Two elements share an ID.
    #[error("duplicate element id: {0}")]
    DuplicateElementId(String),
    /// Text content exceeds maximum length.
    #[error("text content too long (max {MAX_TEXT_CONTENT_LEN} bytes)")]
    TextContentTooLong,
    /// Too many elements in the canvas.
    #[error("too many elements (max {MAX_ELEMENTS_PER_CANVAS})")]
    TooManyElements,
    /// WebSocket message exceeds maximum size.
    #[error("message too large (max {MAX_WS_MESSAGE_SIZE} bytes)")]
    MessageTooLarge,
    /// An element lacks an `id` or known `type`, or a checked field has the
    /// wrong JSON type.
    #[error("malformed element: {0}")]
    Malformed(String),
    /// A numeric property is outside `0..=1`.
    #[error("{field} out of range on element {id}")]
    OutOfRange {
        /// Offending element.
        id: String,
        /// Offending property.
        field: &'static str,
    },
}

/// Validate an element ID.
///
/// # Errors
///
/// Returns [`ValidationError::ElementIdEmpty`] for an empty ID and
/// [`ValidationError::ElementIdTooLong`] past 128 characters.
pub fn validate_element_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::ElementIdEmpty);
    }
    if id.chars().count() > MAX_ELEMENT_ID_LEN {
        return Err(ValidationError::ElementIdTooLong);
    }
    Ok(())
}

/// Validate text content length.
///
/// # Errors
///
/// Returns [`ValidationError::TextContentTooLong`] if the text exceeds 1MB.
pub fn validate_text_content(text: &str) -> Result<(), ValidationError> {
    if text.len() > MAX_TEXT_CONTENT_LEN {
        return Err(ValidationError::TextContentTooLong);
    }
    Ok(())
}

/// Validate WebSocket message size.
///
/// # Errors
///
/// Returns [`ValidationError::MessageTooLarge`] if the message exceeds 1MB.
pub fn validate_message_size(size: usize) -> Result<(), ValidationError> {
    if size > MAX_WS_MESSAGE_SIZE {
        return Err(ValidationError::MessageTooLarge);
    }
    Ok(())
}

/// Validate element count in a canvas.
///
/// # Errors
///
/// Returns [`ValidationError::TooManyElements`] above the limit.
pub fn validate_element_count(count: usize) -> Result<(), ValidationError> {
    if count > MAX_ELEMENTS_PER_CANVAS {
        return Err(ValidationError::TooManyElements);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct StateView {
    elements: Vec<ElementView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementView {
    id: String,
    #[serde(rename = "type")]
    kind: ElementType,
    #[serde(default)]
    opacity: Option<f64>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    video_props: Option<VideoPropsView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ElementType {
    Image,
    Video,
    Text,
}

#[derive(Debug, Deserialize)]
struct VideoPropsView {
    #[serde(default)]
    volume: Option<f64>,
}

fn validate_unit(value: f64, id: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            id: id.to_string(),
            field,
        })
    }
}

fn validate_element(element: &ElementView) -> Result<(), ValidationError> {
    validate_element_id(&element.id)?;
    if let Some(opacity) = element.opacity {
        validate_unit(opacity, &element.id, "opacity")?;
    }
    match element.kind {
        ElementType::Text => {
            if let Some(content) = &element.content {
                validate_text_content(content)?;
            }
        }
        ElementType::Video => {
            if let Some(volume) = element.video_props.as_ref().and_then(|p| p.volume) {
                validate_unit(volume, &element.id, "volume")?;
            }
        }
        ElementType::Image => {}
    }
    Ok(())
}

/// Validate a whole incoming canvas state.
///
/// Fields the checks do not look at, and their absence, are never an error.
///
/// # Errors
///
/// Returns the first rule the state breaks.
pub fn validate_state(state: &StateDocument) -> Result<(), ValidationError> {
    validate_element_count(state.len())?;
    let view: StateView = serde_json::from_str(state.as_str())
        .map_err(|e| ValidationError::Malformed(e.to_string()))?;
    let mut seen = HashSet::with_capacity(view.elements.len());
    for element in &view.elements {
        validate_element(element)?;
        if !seen.insert(element.id.as_str()) {
            return Err(ValidationError::DuplicateElementId(element.id.clone()));
        }
    }
    Ok(())
}
