//! Core data structures of the frame bundle format.

use serde::{Deserialize, Serialize};

/// Format version written into every bundle.
pub const BUNDLE_VERSION: u32 = 1;

/// One row of a frame.
///
/// Serialized as a bare string for plain rows and as a two-element array
/// `[text, [color, ...]]` for colored rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameRow {
    /// Characters with one 6-hex-digit color tag (or `""`) per character.
    Colored(String, Vec<String>),
    /// Characters only.
    Plain(String),
}

impl FrameRow {
    /// Row characters.
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            FrameRow::Colored(text, _) => text,
            FrameRow::Plain(text) => text,
        }
    }

    /// Color tags, empty for plain rows.
    #[inline]
    pub fn colors(&self) -> &[String] {
        match self {
            FrameRow::Colored(_, colors) => colors,
            FrameRow::Plain(_) => &[],
        }
    }

    /// Color tag of the character at `index`; missing tags read as `""`.
    #[inline]
    pub fn color_at(&self, index: usize) -> &str {
        self.colors().get(index).map_or("", String::as_str)
    }

    /// Row length in characters.
    pub fn width(&self) -> usize {
        self.text().chars().count()
    }

    /// Check that a colored row carries exactly one tag per character.
    pub fn is_aligned(&self) -> bool {
        match self {
            FrameRow::Colored(text, colors) => text.chars().count() == colors.len(),
            FrameRow::Plain(_) => true,
        }
    }
}

/// One animation frame: rows ordered top to bottom.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frame {
    pub rows: Vec<FrameRow>,
}

impl Frame {
    pub fn new(rows: Vec<FrameRow>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the first row in characters (0 for an empty frame).
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, FrameRow::width)
    }

    /// Get the frame dimensions as (columns, rows).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }
}

/// Provenance of a bundle. Never affects playback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub threshold_low: u8,
    pub threshold_high: u8,
    /// Glyph ramp, one character per luminance bucket.
    pub chars: String,
    /// Character cell aspect correction applied by the extractor.
    pub font_ratio: f64,
}

/// Animation metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationMeta {
    pub name: String,
    pub fps: f64,
    pub columns: usize,
    pub rows: usize,
    pub frame_count: usize,
    pub colored: bool,
    pub generated_with: GenerationSettings,
}

/// A complete, versioned animation document.
///
/// Produced once by the encoding pipeline and treated as immutable after
/// that; regenerating means building a new bundle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationBundle {
    pub version: u32,
    pub meta: AnimationMeta,
    pub frames: Vec<Frame>,
}

impl AnimationBundle {
    /// Number of stored frames.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Get the frame at the given index.
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }
}
