//! Video-to-bundle encoding pipeline.
//!
//! Decoding the video itself is delegated to a [`FrameExtractor`]; this
//! module turns each extracted pixel dump into a frame and packages the
//! result:
//!
//! ```text
//! extractor -> parse_pixel_dump -> classify -> quantize_frame -> assemble
//! ```
//!
//! Frames are independent of each other, so with the `parallel` feature
//! they are quantized across threads with `rayon`.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::bundle::{assemble, BundleParams};
use crate::classify::{classify_with, BackgroundDetector, FirstRowDetector};
use crate::config::EncoderConfig;
use crate::data::{AnimationBundle, Frame};
use crate::error::{Error, Result};
use crate::parser::parse_pixel_dump;
use crate::quantize::{quantize_frame, GlyphRamp};

/// Video container extensions the extractor is expected to handle.
pub const SUPPORTED_VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mkv", "mov", "avi", "webm"];

/// Sampling parameters handed to the frame extractor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractRequest {
    pub fps: f64,
    /// Output width in pixels (one pixel per character).
    pub columns: u32,
    /// Vertical squash applied after scaling; see [`crate::sizing::GridSize`].
    pub font_ratio: f64,
}

/// External collaborator producing one pixel dump per output frame.
///
/// Each dump is a header line followed by `"<col>,<row>: (<r>,<g>,<b>)"`
/// lines, scanned top to bottom and left to right.
pub trait FrameExtractor {
    fn extract(&mut self, video: &Path, request: &ExtractRequest) -> Result<Vec<String>>;
}

/// Progress of the quantization phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeProgress {
    pub completed: usize,
    pub total: usize,
}

impl EncodeProgress {
    /// Percentage complete (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Check a video path against [`SUPPORTED_VIDEO_EXTENSIONS`].
pub fn check_video_format(video: &Path) -> Result<()> {
    let ext = video
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if SUPPORTED_VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat(ext))
    }
}

/// Turns pixel dumps into frames and frames into bundles.
pub struct Encoder {
    config: EncoderConfig,
    ramp: GlyphRamp,
    detector: Box<dyn BackgroundDetector + Send + Sync>,
}

impl Encoder {
    /// Create an encoder using the row-0 background heuristic.
    pub fn new(config: EncoderConfig) -> Result<Self> {
        config.validate()?;
        let ramp = config.ramp()?;
        Ok(Self {
            config,
            ramp,
            detector: Box::new(FirstRowDetector),
        })
    }

    /// Replace the background detection strategy.
    pub fn with_detector<D>(mut self, detector: D) -> Self
    where
        D: BackgroundDetector + Send + Sync + 'static,
    {
        self.detector = Box::new(detector);
        self
    }

    #[inline]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Request to pass to the frame extractor.
    pub fn extract_request(&self) -> ExtractRequest {
        ExtractRequest {
            fps: self.config.fps,
            columns: self.config.columns,
            font_ratio: self.config.font_ratio,
        }
    }

    /// Quantize one pixel dump. A dump without pixels gives an empty frame.
    pub fn encode_frame(&self, dump: &str) -> Frame {
        let samples = parse_pixel_dump(dump);
        if samples.is_empty() {
            return Frame::default();
        }
        let class = classify_with(self.detector.as_ref(), &samples, self.config.thresholds());
        quantize_frame(&samples, &class, &self.ramp, self.config.color_mode())
    }

    /// Quantize every dump, keeping frame order.
    ///
    /// `progress` is called once per finished frame; with the `parallel`
    /// feature it may be called from worker threads.
    pub fn encode_frames<S, F>(&self, dumps: &[S], progress: F) -> Vec<Frame>
    where
        S: AsRef<str> + Sync,
        F: Fn(EncodeProgress) + Sync,
    {
        let total = dumps.len();
        let completed = AtomicUsize::new(0);
        let encode = |dump: &S| {
            let frame = self.encode_frame(dump.as_ref());
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress(EncodeProgress { completed: done, total });
            frame
        };

        #[cfg(feature = "parallel")]
        let frames = dumps.par_iter().map(encode).collect();
        #[cfg(not(feature = "parallel"))]
        let frames = dumps.iter().map(encode).collect();

        frames
    }

    /// Package frames with this encoder's settings.
    pub fn bundle(&self, frames: Vec<Frame>) -> Result<AnimationBundle> {
        assemble(
            frames,
            BundleParams {
                name: self.config.name.clone(),
                fps: self.config.fps,
                colored: self.config.colored,
                generated_with: self.config.generation_settings(),
            },
        )
    }

    /// Run the whole pipeline on a video file.
    ///
    /// An empty configured name is replaced by one derived from the file
    /// name.
    pub fn encode_video<E, F>(&self, extractor: &mut E, video: &Path, progress: F) -> Result<AnimationBundle>
    where
        E: FrameExtractor,
        F: Fn(EncodeProgress) + Sync,
    {
        check_video_format(video)?;

        let request = self.extract_request();
        log::debug!(
            "extracting {} at {} fps, {} columns",
            video.display(),
            request.fps,
            request.columns
        );
        let dumps = extractor.extract(video, &request)?;

        let frames = self.encode_frames(&dumps, progress);
        let mut bundle = self.bundle(frames)?;
        if bundle.meta.name.is_empty() {
            bundle.meta.name = crate::config::animation_name_from_path(video);
        }

        log::info!(
            "encoded '{}': {} frames, {}x{}",
            bundle.meta.name,
            bundle.meta.frame_count,
            bundle.meta.columns,
            bundle.meta.rows
        );
        Ok(bundle)
    }
}
