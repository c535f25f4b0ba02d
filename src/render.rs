//! Applying decoded frames to a display surface.
//!
//! One renderer covers all three strategies. Plain bundles and colored
//! bundles on surfaces without child handles are replaced wholesale. The
//! incremental strategy keeps a pool of row and run nodes, reused across
//! frames, and only writes the fields that changed.

use crate::decode::{DecodedFrames, SegmentFrame};
use crate::surface::DisplaySurface;

/// How frames are written to the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStrategy {
    /// Replace the text content.
    Text,
    /// Replace the markup with a pre-escaped string.
    Markup,
    /// Diff color runs against a pool of persistent nodes.
    Incremental,
}

impl RenderStrategy {
    /// Pick a strategy for a bundle and a surface capability.
    ///
    /// ```rust
    /// use rune_ascii_core::render::RenderStrategy;
    ///
    /// assert_eq!(RenderStrategy::select(false, true), RenderStrategy::Text);
    /// assert_eq!(RenderStrategy::select(true, false), RenderStrategy::Markup);
    /// assert_eq!(RenderStrategy::select(true, true), RenderStrategy::Incremental);
    /// ```
    pub fn select(colored: bool, supports_incremental: bool) -> Self {
        match (colored, supports_incremental) {
            (false, _) => RenderStrategy::Text,
            (true, false) => RenderStrategy::Markup,
            (true, true) => RenderStrategy::Incremental,
        }
    }
}

/// Run node and the values it currently displays.
#[derive(Debug)]
struct RunSlot<H> {
    handle: H,
    text: String,
    color: String,
    visible: bool,
}

/// Row node with its run pool.
#[derive(Debug)]
struct RowSlot<H> {
    handle: H,
    visible: bool,
    runs: Vec<RunSlot<H>>,
}

/// Renderer for one surface.
///
/// Pools only grow. Surplus nodes are hidden, never removed, and shown
/// again when a later frame needs them.
#[derive(Debug)]
pub struct FrameRenderer<H> {
    rows: Vec<RowSlot<H>>,
    active: Option<RenderStrategy>,
}

impl<H> Default for FrameRenderer<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> FrameRenderer<H> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            active: None,
        }
    }

    /// Forget all pooled nodes. The next render starts from a clean surface.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.active = None;
    }

    /// Strategy of the last render, if any.
    #[inline]
    pub fn active_strategy(&self) -> Option<RenderStrategy> {
        self.active
    }

    /// Number of pooled row nodes.
    pub fn row_pool_len(&self) -> usize {
        self.rows.len()
    }

    /// Number of pooled run nodes across all rows.
    pub fn run_pool_len(&self) -> usize {
        self.rows.iter().map(|row| row.runs.len()).sum()
    }

    /// Draw frame `index`. Returns `false` if there is no such frame.
    pub fn render<S>(&mut self, surface: &mut S, frames: &DecodedFrames, index: usize) -> bool
    where
        S: DisplaySurface<Handle = H> + ?Sized,
    {
        if index >= frames.len() {
            return false;
        }

        let strategy = frames.strategy();
        if self.active != Some(strategy) {
            // wholesale writes replace any pooled children
            self.rows.clear();
            if strategy == RenderStrategy::Incremental {
                surface.clear();
            }
            self.active = Some(strategy);
        }

        match frames {
            DecodedFrames::Text(frames) => surface.set_text(&frames[index]),
            DecodedFrames::Markup(frames) => surface.set_markup(&frames[index]),
            DecodedFrames::Segments(frames) => self.apply_segments(surface, &frames[index]),
        }
        true
    }

    fn apply_segments<S>(&mut self, surface: &mut S, frame: &SegmentFrame)
    where
        S: DisplaySurface<Handle = H> + ?Sized,
    {
        for (r, runs) in frame.iter().enumerate() {
            if r == self.rows.len() {
                let Some(handle) = surface.append_row() else {
                    log::warn!("surface refused row node {}", r);
                    return;
                };
                self.rows.push(RowSlot {
                    handle,
                    visible: true,
                    runs: Vec::new(),
                });
            }

            let row = &mut self.rows[r];
            if !row.visible {
                surface.set_visible(&row.handle, true);
                row.visible = true;
            }

            for (i, segment) in runs.iter().enumerate() {
                if i == row.runs.len() {
                    let Some(handle) = surface.append_run(&row.handle) else {
                        log::warn!("surface refused run node {} in row {}", i, r);
                        break;
                    };
                    row.runs.push(RunSlot {
                        handle,
                        text: String::new(),
                        color: String::new(),
                        visible: true,
                    });
                }

                let run = &mut row.runs[i];
                if !run.visible {
                    surface.set_visible(&run.handle, true);
                    run.visible = true;
                }
                if run.text != segment.text {
                    surface.set_run_text(&run.handle, &segment.text);
                    run.text.clone_from(&segment.text);
                }
                if run.color != segment.color {
                    surface.set_run_color(&run.handle, &segment.color);
                    run.color.clone_from(&segment.color);
                }
            }

            for run in row.runs.iter_mut().skip(runs.len()) {
                if run.visible {
                    surface.set_visible(&run.handle, false);
                    run.visible = false;
                }
            }
        }

        for row in self.rows.iter_mut().skip(frame.len()) {
            if row.visible {
                surface.set_visible(&row.handle, false);
                row.visible = false;
            }
        }
    }
}
