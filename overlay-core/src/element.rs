//! Canvas elements - the renderable units of an overlay.
//!
//! Elements travel over the wire in the camelCase JSON shape the editor and
//! overlay clients already speak:
//!
//! ```json
//! {"id":"img1","type":"image","url":"/media/1/logo.png",
//!  "position":{"x":100,"y":100},"size":{"width":320,"height":180},
//!  "zIndex":10,"visible":true,"opacity":1}
//! ```

use serde::{Deserialize, Serialize};

/// Top-left corner of an element in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Pixels from the left edge.
    pub x: f64,
    /// Pixels from the top edge.
    pub y: f64,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of an element in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(400.0, 100.0)
    }
}

/// Playback settings for a video element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoProps {
    /// Whether the video is currently playing.
    pub playing: bool,
    /// Volume in `0.0..=1.0`.
    pub volume: f64,
    /// Whether audio is muted.
    pub muted: bool,
    /// Whether playback restarts at the end.
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl Default for VideoProps {
    // New videos autoplay muted and looping so an overlay never blares audio.
    fn default() -> Self {
        Self {
            playing: true,
            volume: 1.0,
            muted: true,
            looping: true,
        }
    }
}

/// Horizontal alignment of text content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    Left,
    /// Centered.
    #[default]
    Center,
    /// Flush right.
    Right,
}

/// Content and styling of a text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyle {
    /// The text to display.
    pub content: String,
    /// Text color (CSS color string).
    pub color: String,
    /// Font family name.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// CSS font weight (`"normal"`, `"bold"`, `"700"`...).
    pub font_weight: String,
    /// Horizontal alignment.
    pub text_align: TextAlign,
    /// Background fill behind the text (CSS color string).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// When set, the background fill is not painted.
    pub transparent_background: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            content: String::new(),
            color: "#ffffff".to_string(),
            font_family: "Arial".to_string(),
            font_size: 80.0,
            font_weight: "bold".to_string(),
            text_align: TextAlign::Center,
            background_color: None,
            transparent_background: true,
        }
    }
}

/// The type-specific part of an element, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A still image.
    Image {
        /// Locator of the uploaded asset.
        url: String,
    },
    /// A video clip.
    Video {
        /// Locator of the uploaded asset.
        url: String,
        /// Playback settings.
        #[serde(default, rename = "videoProps")]
        video_props: VideoProps,
    },
    /// A styled text block.
    Text(TextStyle),
}

impl ElementKind {
    /// Discriminator string as it appears on the wire.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
            Self::Text(_) => "text",
        }
    }

    /// Asset locator for media elements.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Image { url } | Self::Video { url, .. } => Some(url),
            Self::Text(_) => None,
        }
    }
}

/// A single renderable unit on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Opaque identifier, unique within one canvas state.
    pub id: String,
    /// Type-specific content.
    #[serde(flatten)]
    pub kind: ElementKind,
    /// Top-left corner.
    #[serde(default)]
    pub position: Position,
    /// Extent.
    #[serde(default)]
    pub size: Size,
    /// Paint order; higher values are drawn on top.
    #[serde(default)]
    pub z_index: i32,
    /// Whether the element is drawn at all.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Opacity in `0.0..=1.0`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_visible() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

impl Element {
    /// Create a visible, fully opaque element at the origin.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            position: Position::default(),
            size: Size::default(),
            z_index: 0,
            visible: true,
            opacity: 1.0,
        }
    }

    /// Create an image element.
    #[must_use]
    pub fn image(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(id, ElementKind::Image { url: url.into() })
    }

    /// Create a video element with default playback settings.
    #[must_use]
    pub fn video(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(
            id,
            ElementKind::Video {
                url: url.into(),
                video_props: VideoProps::default(),
            },
        )
    }

    /// Create a text element with default styling.
    #[must_use]
    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(
            id,
            ElementKind::Text(TextStyle {
                content: content.into(),
                ..TextStyle::default()
            }),
        )
    }

    /// Set the position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Set the size.
    #[must_use]
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Set the paint order.
    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Check if a point (in canvas coordinates) is within this element.
    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let p = &self.position;
        x >= p.x && x <= p.x + self.size.width && y >= p.y && y <= p.y + self.size.height
    }
}
