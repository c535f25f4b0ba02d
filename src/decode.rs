//! Expanding bundle frames into renderable units.
//!
//! Plain bundles become one newline-joined string per frame. Colored
//! bundles become either a pre-escaped markup string per frame or, for the
//! incremental renderer, a list of color runs per row. Markup is always
//! built from the runs, so both forms show the same characters in the same
//! colors.

use crate::color::css_color;
use crate::data::{AnimationBundle, Frame, FrameRow};
use crate::render::RenderStrategy;

/// Maximal span of characters in one row sharing a color tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    /// Six hex digits, or empty for the surface's default color.
    pub color: String,
}

impl Segment {
    pub fn new(text: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: color.into(),
        }
    }
}

/// Runs of one row, left to right.
pub type SegmentRow = Vec<Segment>;

/// Runs of every row of a frame, top to bottom.
pub type SegmentFrame = Vec<SegmentRow>;

/// Frame text with rows joined by newlines.
pub fn plain_text(frame: &Frame) -> String {
    frame
        .rows
        .iter()
        .map(FrameRow::text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Merge adjacent same-color characters of a row into runs.
///
/// ## Example
///
/// ```rust
/// use rune_ascii_core::decode::{row_segments, Segment};
/// use rune_ascii_core::FrameRow;
///
/// let row = FrameRow::Colored(
///     "AB C".into(),
///     vec!["ff0000".into(), "ff0000".into(), "".into(), "00ff00".into()],
/// );
/// assert_eq!(
///     row_segments(&row),
///     vec![
///         Segment::new("AB", "ff0000"),
///         Segment::new(" ", ""),
///         Segment::new("C", "00ff00"),
///     ]
/// );
/// ```
pub fn row_segments(row: &FrameRow) -> SegmentRow {
    let mut segments: SegmentRow = Vec::new();

    for (i, ch) in row.text().chars().enumerate() {
        let color = row.color_at(i);
        if let Some(last) = segments.last_mut() {
            if last.color == color {
                last.text.push(ch);
                continue;
            }
        }
        segments.push(Segment::new(ch.to_string(), color));
    }

    segments
}

/// Color runs for every row of a frame.
pub fn frame_segments(frame: &Frame) -> SegmentFrame {
    frame.rows.iter().map(row_segments).collect()
}

/// Escape `&`, `<` and `>` for inclusion in markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Markup for a segmented frame: colored runs wrapped in
/// `<span style="color:#rrggbb">`, default-colored runs bare, rows joined
/// by newlines.
pub fn segments_to_markup(frame: &SegmentFrame) -> String {
    let lines: Vec<String> = frame
        .iter()
        .map(|row| {
            let mut html = String::new();
            for segment in row {
                let chunk = escape_html(&segment.text);
                match css_color(&segment.color) {
                    Some(color) => {
                        html.push_str("<span style=\"color:");
                        html.push_str(&color);
                        html.push_str("\">");
                        html.push_str(&chunk);
                        html.push_str("</span>");
                    }
                    None => html.push_str(&chunk),
                }
            }
            html
        })
        .collect();
    lines.join("\n")
}

/// Pre-escaped markup string for a colored frame.
pub fn colored_markup(frame: &Frame) -> String {
    segments_to_markup(&frame_segments(frame))
}

/// All frames of a bundle, decoded for one render strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedFrames {
    /// Plain text per frame.
    Text(Vec<String>),
    /// Pre-escaped markup per frame.
    Markup(Vec<String>),
    /// Color runs per row per frame.
    Segments(Vec<SegmentFrame>),
}

impl DecodedFrames {
    /// Decode every frame of a bundle for the given strategy.
    pub fn decode(bundle: &AnimationBundle, strategy: RenderStrategy) -> Self {
        match strategy {
            RenderStrategy::Text => {
                DecodedFrames::Text(bundle.frames.iter().map(plain_text).collect())
            }
            RenderStrategy::Markup => {
                DecodedFrames::Markup(bundle.frames.iter().map(colored_markup).collect())
            }
            RenderStrategy::Incremental => {
                DecodedFrames::Segments(bundle.frames.iter().map(frame_segments).collect())
            }
        }
    }

    /// Number of decoded frames.
    pub fn len(&self) -> usize {
        match self {
            DecodedFrames::Text(frames) | DecodedFrames::Markup(frames) => frames.len(),
            DecodedFrames::Segments(frames) => frames.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strategy these frames were decoded for.
    pub fn strategy(&self) -> RenderStrategy {
        match self {
            DecodedFrames::Text(_) => RenderStrategy::Text,
            DecodedFrames::Markup(_) => RenderStrategy::Markup,
            DecodedFrames::Segments(_) => RenderStrategy::Incremental,
        }
    }
}
