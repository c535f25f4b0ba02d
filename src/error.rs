//! Error type shared by assembly, configuration, serialization and transport.
//!
//! The algorithmic stages (pixel parsing, classification, quantization,
//! decoding, rendering, timing) never produce errors; malformed input
//! degrades to empty or background output instead.

/// Result alias carrying the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A frame does not share the grid shape of the first non-empty frame.
    #[error(
        "frame {index} is {columns}x{rows}, expected {expected_columns}x{expected_rows} like the first non-empty frame"
    )]
    ShapeMismatch {
        index: usize,
        expected_rows: usize,
        expected_columns: usize,
        rows: usize,
        columns: usize,
    },
    /// Bundle declares a format version this crate does not read.
    #[error("unsupported bundle version {0}, expected 1")]
    UnsupportedVersion(u32),
    /// `meta.frameCount` disagrees with the number of stored frames.
    #[error("bundle declares {declared} frames but contains {actual}")]
    FrameCountMismatch { declared: usize, actual: usize },
    #[error("glyph ramp must contain at least one character")]
    EmptyGlyphRamp,
    #[error("fps must be a positive finite number, got {0}")]
    InvalidFps(f64),
    #[error("columns must be greater than zero")]
    InvalidColumns,
    #[error("threshold low ({low}) must not exceed threshold high ({high})")]
    InvalidThresholds { low: u8, high: u8 },
    /// Source video extension is not one the extractor accepts.
    #[error("unsupported video format \".{0}\"")]
    UnsupportedFormat(String),
    /// The frame extractor collaborator failed.
    #[error("frame extraction failed: {0}")]
    Extraction(String),
    /// The bundle transport collaborator failed to deliver a document.
    #[error("bundle transport failed: {0}")]
    Transport(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "toml")]
    #[error(transparent)]
    Config(#[from] toml::de::Error),
}
