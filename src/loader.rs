//! Bundle addressing, transport and load bookkeeping.
//!
//! Fetching is delegated to a [`BundleTransport`] so the same loading code
//! runs against the browser fetch API, the filesystem or an in-memory
//! fixture. A load can be abandoned at any time by dropping interest in
//! its [`LoadTicket`]; results arriving for an outdated ticket are
//! discarded by [`LoadGuard`].

use std::future::Future;
use std::path::PathBuf;

use crate::bundle::{bundle_file_name, AnimationSize};
use crate::data::AnimationBundle;
use crate::error::{Error, Result};

/// Published animation package on the jsDelivr CDN.
pub const DEFAULT_CDN_BASE: &str = "https://cdn.jsdelivr.net/npm/@rune-ascii/animations@0.1.0";

/// Where named bundles are published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CdnConfig {
    base: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CDN_BASE)
    }
}

impl CdnConfig {
    /// Use a different base URL (or directory, with [`FileTransport`]).
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    #[inline]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Address of a named animation.
    ///
    /// ```rust
    /// use rune_ascii_core::bundle::AnimationSize;
    /// use rune_ascii_core::loader::CdnConfig;
    ///
    /// let cdn = CdnConfig::new("https://example.com/anims/");
    /// assert_eq!(
    ///     cdn.animation_url("coin", AnimationSize::Small),
    ///     "https://example.com/anims/coin.s.rune.json"
    /// );
    /// ```
    pub fn animation_url(&self, name: &str, size: AnimationSize) -> String {
        format!("{}/{}", self.base, bundle_file_name(name, size))
    }
}

/// What a view should play.
#[derive(Clone, Debug, PartialEq)]
pub enum BundleSource {
    /// Already in memory; no transport involved.
    Inline(AnimationBundle),
    /// Explicit address.
    Url(String),
    /// Published animation, resolved through [`CdnConfig`].
    Named { name: String, size: AnimationSize },
}

impl BundleSource {
    /// Shorthand for a medium-size named animation.
    pub fn named(name: impl Into<String>) -> Self {
        BundleSource::Named {
            name: name.into(),
            size: AnimationSize::Medium,
        }
    }

    /// Address to fetch, or `None` for inline bundles.
    pub fn address(&self, cdn: &CdnConfig) -> Option<String> {
        match self {
            BundleSource::Inline(_) => None,
            BundleSource::Url(url) => Some(url.clone()),
            BundleSource::Named { name, size } => Some(cdn.animation_url(name, *size)),
        }
    }
}

/// Fetches bundle documents.
///
/// Implementations own timeouts; failures are reported once, not retried.
///
/// No `Send` bounds, so browser (single-threaded WASM) transports fit too.
pub trait BundleTransport {
    fn fetch(&self, address: &str) -> impl Future<Output = Result<String>>;
}

/// Reads bundles from the filesystem, resolving relative addresses against
/// a root directory.
#[derive(Clone, Debug, Default)]
pub struct FileTransport {
    root: PathBuf,
}

impl FileTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BundleTransport for FileTransport {
    fn fetch(&self, address: &str) -> impl Future<Output = Result<String>> {
        let path = self.root.join(address);
        async move {
            std::fs::read_to_string(&path)
                .map_err(|e| Error::Transport(format!("{}: {}", path.display(), e)))
        }
    }
}

/// Resolve, fetch and parse a bundle.
pub async fn load_bundle<T>(transport: &T, source: &BundleSource, cdn: &CdnConfig) -> Result<AnimationBundle>
where
    T: BundleTransport + ?Sized,
{
    let address = match source {
        BundleSource::Inline(bundle) => return Ok(bundle.clone()),
        BundleSource::Url(url) => url.clone(),
        BundleSource::Named { name, size } => cdn.animation_url(name, *size),
    };

    log::debug!("loading bundle from {}", address);
    let document = transport.fetch(&address).await.map_err(|e| {
        log::warn!("failed to fetch {}: {}", address, e);
        e
    })?;
    let bundle = AnimationBundle::from_json(&document)?;
    log::debug!(
        "loaded '{}': {} frames at {} fps",
        bundle.meta.name,
        bundle.meta.frame_count,
        bundle.meta.fps
    );
    Ok(bundle)
}

/// Loading state of one view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    /// Load failed; the surface keeps whatever it showed before.
    Failed(String),
}

/// Identifies one load attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Generation counter that invalidates outdated loads.
#[derive(Clone, Debug, Default)]
pub struct LoadGuard {
    generation: u64,
}

impl LoadGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new attempt, invalidating all earlier tickets.
    pub fn begin(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Invalidate every outstanding ticket.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Whether results for `ticket` may still be applied.
    #[inline]
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation
    }
}
