//! Display surface capability.
//!
//! A surface is the mutable node a player draws into. Wholesale strategies
//! only need `set_text`/`set_markup`; the incremental renderer also needs
//! stable child handles it can reuse and hide across frames.

use crate::decode::{Segment, SegmentFrame};

/// Mutable display target for rendered frames.
pub trait DisplaySurface {
    /// Stable reference to a row or run node.
    type Handle;

    /// Whether child handles are available for incremental updates.
    fn supports_incremental_update(&self) -> bool;

    /// Replace all content with plain text.
    fn set_text(&mut self, text: &str);

    /// Replace all content with pre-escaped markup.
    fn set_markup(&mut self, markup: &str);

    /// Remove all content and child nodes.
    fn clear(&mut self);

    /// Append an empty, visible row node. `None` if the node could not be
    /// created.
    fn append_row(&mut self) -> Option<Self::Handle>;

    /// Append an empty, visible, default-colored run node to a row.
    fn append_run(&mut self, row: &Self::Handle) -> Option<Self::Handle>;

    fn set_run_text(&mut self, run: &Self::Handle, text: &str);

    /// Set a run's color tag; an empty tag restores the default color.
    fn set_run_color(&mut self, run: &Self::Handle, color: &str);

    /// Show or hide a row or run without destroying it.
    fn set_visible(&mut self, node: &Self::Handle, visible: bool);
}

/// Content currently held by a [`MemorySurface`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SurfaceContent {
    #[default]
    Empty,
    Text(String),
    Markup(String),
    /// Row and run nodes; see [`MemorySurface::visible_segments`].
    Nodes,
}

#[derive(Clone, Debug, Default)]
struct Node {
    text: String,
    color: String,
    visible: bool,
    children: Vec<usize>,
}

/// Headless surface backed by an arena of nodes.
///
/// Counts every mutation, which makes it suitable for checking how much
/// work a render strategy does per frame.
#[derive(Clone, Debug, Default)]
pub struct MemorySurface {
    incremental: bool,
    content: SurfaceContent,
    nodes: Vec<Node>,
    rows: Vec<usize>,
    mutations: usize,
}

impl MemorySurface {
    /// Create a surface, optionally exposing child handles.
    pub fn new(incremental: bool) -> Self {
        Self {
            incremental,
            ..Self::default()
        }
    }

    #[inline]
    pub fn content(&self) -> &SurfaceContent {
        &self.content
    }

    /// Number of mutating calls received so far.
    #[inline]
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    pub fn reset_mutations(&mut self) {
        self.mutations = 0;
    }

    /// Total row and run nodes ever created and not cleared.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Runs of every visible row, skipping hidden runs.
    pub fn visible_segments(&self) -> SegmentFrame {
        self.rows
            .iter()
            .map(|&row| &self.nodes[row])
            .filter(|row| row.visible)
            .map(|row| {
                row.children
                    .iter()
                    .map(|&run| &self.nodes[run])
                    .filter(|run| run.visible)
                    .map(|run| Segment::new(run.text.clone(), run.color.clone()))
                    .collect()
            })
            .collect()
    }

    /// Visible characters, regardless of how they were written.
    pub fn visible_text(&self) -> String {
        match &self.content {
            SurfaceContent::Empty | SurfaceContent::Markup(_) => String::new(),
            SurfaceContent::Text(text) => text.clone(),
            SurfaceContent::Nodes => self
                .visible_segments()
                .iter()
                .map(|row| row.iter().map(|s| s.text.as_str()).collect::<String>())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn replace(&mut self, content: SurfaceContent) {
        self.nodes.clear();
        self.rows.clear();
        self.content = content;
        self.mutations += 1;
    }

    fn push_node(&mut self) -> usize {
        self.nodes.push(Node {
            visible: true,
            ..Node::default()
        });
        self.mutations += 1;
        self.nodes.len() - 1
    }
}

impl DisplaySurface for MemorySurface {
    type Handle = usize;

    fn supports_incremental_update(&self) -> bool {
        self.incremental
    }

    fn set_text(&mut self, text: &str) {
        self.replace(SurfaceContent::Text(text.to_string()));
    }

    fn set_markup(&mut self, markup: &str) {
        self.replace(SurfaceContent::Markup(markup.to_string()));
    }

    fn clear(&mut self) {
        self.replace(SurfaceContent::Empty);
    }

    fn append_row(&mut self) -> Option<usize> {
        if !self.incremental {
            return None;
        }
        if self.content != SurfaceContent::Nodes {
            self.content = SurfaceContent::Nodes;
        }
        let id = self.push_node();
        self.rows.push(id);
        Some(id)
    }

    fn append_run(&mut self, row: &usize) -> Option<usize> {
        if !self.incremental || *row >= self.nodes.len() {
            return None;
        }
        let id = self.push_node();
        self.nodes[*row].children.push(id);
        Some(id)
    }

    fn set_run_text(&mut self, run: &usize, text: &str) {
        if let Some(node) = self.nodes.get_mut(*run) {
            node.text = text.to_string();
            self.mutations += 1;
        }
    }

    fn set_run_color(&mut self, run: &usize, color: &str) {
        if let Some(node) = self.nodes.get_mut(*run) {
            node.color = color.to_string();
            self.mutations += 1;
        }
    }

    fn set_visible(&mut self, node: &usize, visible: bool) {
        if let Some(node) = self.nodes.get_mut(*node) {
            node.visible = visible;
            self.mutations += 1;
        }
    }
}
