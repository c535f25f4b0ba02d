//! # rune-ascii-core
//!
//! Video-to-ASCII animation bundles and their playback engine.
//!
//! The encoding half turns per-frame pixel dumps into glyph grids with
//! optional per-character colors and packages them as a versioned JSON
//! bundle. The playback half decodes a bundle, drives it with a
//! drift-corrected clock and writes frames to a display surface, gated on
//! visibility, focus and motion preferences.
//!
//! ## Features
//!
//! - `web` - DOM element surface, `requestAnimationFrame` scheduler and
//!   fetch transport for WASM hosts
//! - `toml` - load [`EncoderConfig`] from TOML
//! - `parallel` - quantize frames across threads with `rayon`
//!
//! ## Example
//!
//! ```rust
//! use rune_ascii_core::lifecycle::HostState;
//! use rune_ascii_core::surface::MemorySurface;
//! use rune_ascii_core::timing::ManualScheduler;
//! use rune_ascii_core::{Encoder, EncoderConfig, Player, PlayerOptions};
//!
//! let encoder = Encoder::new(EncoderConfig {
//!     name: "blink".into(),
//!     chars: " .@".into(),
//!     ..EncoderConfig::default()
//! })
//! .unwrap();
//! let dumps = [
//!     "# header\n0,0: (0,0,0)\n1,0: (250,250,250)",
//!     "# header\n0,0: (250,250,250)\n1,0: (0,0,0)",
//! ];
//! let frames = encoder.encode_frames(&dumps, |_| {});
//! let bundle = encoder.bundle(frames).unwrap();
//!
//! let host = HostState { intersecting: true, focused: true, ..HostState::default() };
//! let mut player = Player::new(
//!     MemorySurface::new(true),
//!     ManualScheduler::new(),
//!     host,
//!     PlayerOptions::default(),
//! );
//! player.apply_bundle(&bundle);
//! assert_eq!(player.surface().visible_text(), " @");
//!
//! player.tick(0.0);
//! player.tick(1000.0 / 30.0);
//! assert_eq!(player.surface().visible_text(), "@ ");
//! ```

pub mod bundle;
pub mod classify;
pub mod color;
pub mod config;
mod data;
pub mod decode;
pub mod encode;
mod error;
pub mod lifecycle;
pub mod loader;
mod parser;
pub mod player;
pub mod quantize;
pub mod render;
pub mod sizing;
pub mod surface;
pub mod timing;
#[cfg(feature = "web")]
pub mod web;

pub use bundle::{assemble, bundle_file_name, write_bundle, AnimationSize, BundleReport};
pub use config::{EncoderConfig, PlayerOptions};
pub use data::{AnimationBundle, AnimationMeta, Frame, FrameRow, GenerationSettings, BUNDLE_VERSION};
pub use decode::DecodedFrames;
pub use encode::{Encoder, FrameExtractor};
pub use error::{Error, Result};
pub use loader::{BundleSource, BundleTransport, CdnConfig};
pub use parser::{parse_pixel_dump, parse_pixel_line, PixelSample};
pub use player::Player;
pub use render::{FrameRenderer, RenderStrategy};
pub use surface::DisplaySurface;
pub use timing::{PlaybackClock, Scheduler};
