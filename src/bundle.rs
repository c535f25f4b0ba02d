//! Bundle assembly, serialization and file naming.

use std::fs;
use std::path::Path;

use crate::data::{AnimationBundle, AnimationMeta, Frame, GenerationSettings, BUNDLE_VERSION};
use crate::error::{Error, Result};

/// File extension shared by every bundle.
pub const BUNDLE_EXTENSION: &str = "rune.json";

/// Size variant of a published animation.
///
/// Each variant is a complete, independent bundle; only the file name
/// differs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnimationSize {
    /// Fewer columns, published with an `.s` suffix.
    Small,
    #[default]
    Medium,
}

impl AnimationSize {
    /// Infix inserted before the bundle extension.
    pub fn suffix(self) -> &'static str {
        match self {
            AnimationSize::Small => ".s",
            AnimationSize::Medium => "",
        }
    }
}

/// File name of a bundle, e.g. `coin.rune.json` or `coin.s.rune.json`.
pub fn bundle_file_name(name: &str, size: AnimationSize) -> String {
    format!("{name}{}.{BUNDLE_EXTENSION}", size.suffix())
}

/// Everything besides the frames that goes into a bundle.
#[derive(Clone, Debug, PartialEq)]
pub struct BundleParams {
    pub name: String,
    pub fps: f64,
    pub colored: bool,
    pub generated_with: GenerationSettings,
}

/// Grid shape as (rows, columns), taken from the first frame that has rows.
///
/// Frames with no rows are degenerate all-background frames and carry no
/// shape information.
pub fn infer_grid(frames: &[Frame]) -> (usize, usize) {
    frames
        .iter()
        .find(|frame| frame.height() > 0)
        .map_or((0, 0), |frame| (frame.height(), frame.width()))
}

/// Check that every non-empty frame matches the inferred grid.
///
/// Fails with the index of the first offending frame.
pub fn validate_shape(frames: &[Frame]) -> Result<()> {
    let (expected_rows, expected_columns) = infer_grid(frames);

    for (index, frame) in frames.iter().enumerate() {
        if frame.height() == 0 {
            continue;
        }
        let ragged = frame.rows.iter().find(|row| row.width() != expected_columns);
        if frame.height() != expected_rows || ragged.is_some() {
            let columns = ragged.map_or(frame.width(), |row| row.width());
            log::warn!(
                "frame {} has shape {}x{}, expected {}x{}",
                index,
                columns,
                frame.height(),
                expected_columns,
                expected_rows
            );
            return Err(Error::ShapeMismatch {
                index,
                expected_rows,
                expected_columns,
                rows: frame.height(),
                columns,
            });
        }
    }
    Ok(())
}

/// Package frames and metadata into a bundle.
///
/// Grid dimensions and frame count are derived from the frames; mismatched
/// frame shapes are rejected.
///
/// ## Example
///
/// ```rust
/// use rune_ascii_core::bundle::{assemble, BundleParams};
/// use rune_ascii_core::{Frame, FrameRow, GenerationSettings};
///
/// let frames = vec![Frame::new(vec![FrameRow::Plain(" @".into())]); 3];
/// let bundle = assemble(frames, BundleParams {
///     name: "dot".into(),
///     fps: 24.0,
///     colored: false,
///     generated_with: GenerationSettings {
///         threshold_low: 5,
///         threshold_high: 235,
///         chars: " .@".into(),
///         font_ratio: 0.44,
///     },
/// }).unwrap();
///
/// assert_eq!((bundle.meta.columns, bundle.meta.rows, bundle.meta.frame_count), (2, 1, 3));
/// ```
pub fn assemble(frames: Vec<Frame>, params: BundleParams) -> Result<AnimationBundle> {
    validate_shape(&frames)?;
    let (rows, columns) = infer_grid(&frames);

    log::debug!(
        "assembled bundle '{}': {} frames of {}x{}",
        params.name,
        frames.len(),
        columns,
        rows
    );

    Ok(AnimationBundle {
        version: BUNDLE_VERSION,
        meta: AnimationMeta {
            name: params.name,
            fps: params.fps,
            columns,
            rows,
            frame_count: frames.len(),
            colored: params.colored,
            generated_with: params.generated_with,
        },
        frames,
    })
}

impl AnimationBundle {
    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and check a bundle document.
    ///
    /// Rejects versions other than 1 and frame counts that disagree with
    /// the stored frames.
    pub fn from_json(json: &str) -> Result<Self> {
        let bundle: AnimationBundle = serde_json::from_str(json)?;
        bundle.check()?;
        Ok(bundle)
    }

    /// Read and parse a bundle file.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn check(&self) -> Result<()> {
        if self.version != BUNDLE_VERSION {
            return Err(Error::UnsupportedVersion(self.version));
        }
        if self.meta.frame_count != self.frames.len() {
            return Err(Error::FrameCountMismatch {
                declared: self.meta.frame_count,
                actual: self.frames.len(),
            });
        }
        Ok(())
    }
}

/// Diagnostics about a written bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BundleReport {
    pub rows: usize,
    pub columns: usize,
    pub frame_count: usize,
    pub size_bytes: u64,
}

impl BundleReport {
    /// Size in megabytes with one decimal, e.g. `"1.4"`.
    pub fn size_mb(&self) -> String {
        format!("{:.1}", self.size_bytes as f64 / 1024.0 / 1024.0)
    }
}

/// Write a bundle as compact JSON and report its size.
pub fn write_bundle<P: AsRef<Path>>(bundle: &AnimationBundle, path: P) -> Result<BundleReport> {
    let bytes = serde_json::to_vec(bundle)?;
    fs::write(path.as_ref(), &bytes)?;

    let report = BundleReport {
        rows: bundle.meta.rows,
        columns: bundle.meta.columns,
        frame_count: bundle.meta.frame_count,
        size_bytes: bytes.len() as u64,
    };
    log::debug!(
        "wrote {} ({} MB)",
        path.as_ref().display(),
        report.size_mb()
    );
    Ok(report)
}
