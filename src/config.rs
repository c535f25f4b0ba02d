//! Encoder and player configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classify::Thresholds;
use crate::data::GenerationSettings;
use crate::error::{Error, Result};
use crate::quantize::{ColorMode, GlyphRamp};

/// Default glyph ramp, sparsest to densest.
pub const DEFAULT_CHARS: &str = " .~-_=+*%#0oOxX@$";

/// Settings for turning a video into a bundle.
///
/// Every field has a default, so a partial `rune.toml` (feature `toml`)
/// only needs the values it overrides. Keys may be written in snake_case
/// or in the camelCase used by the bundle's `generatedWith` block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Animation name; empty means "derive from the video file name".
    pub name: String,
    pub fps: f64,
    /// Output width in characters.
    pub columns: u32,
    /// Dark background cutoff.
    #[serde(alias = "thresholdLow")]
    pub threshold_low: u8,
    /// Light background cutoff.
    #[serde(alias = "thresholdHigh")]
    pub threshold_high: u8,
    /// Glyph ramp.
    pub chars: String,
    /// Character cell aspect correction (height / width).
    #[serde(alias = "fontRatio")]
    pub font_ratio: f64,
    /// Emit per-character color tags.
    pub colored: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            fps: 30.0,
            columns: 90,
            threshold_low: 5,
            threshold_high: 235,
            chars: DEFAULT_CHARS.to_string(),
            font_ratio: 0.44,
            colored: true,
        }
    }
}

impl EncoderConfig {
    /// Parse a TOML document into a config, then validate it.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.chars.is_empty() {
            return Err(Error::EmptyGlyphRamp);
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(Error::InvalidFps(self.fps));
        }
        if self.columns == 0 {
            return Err(Error::InvalidColumns);
        }
        if self.threshold_low > self.threshold_high {
            return Err(Error::InvalidThresholds {
                low: self.threshold_low,
                high: self.threshold_high,
            });
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.threshold_low, self.threshold_high)
    }

    pub fn ramp(&self) -> Result<GlyphRamp> {
        GlyphRamp::new(&self.chars)
    }

    pub fn color_mode(&self) -> ColorMode {
        if self.colored {
            ColorMode::Colored
        } else {
            ColorMode::Plain
        }
    }

    /// Provenance block recorded in the bundle.
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            threshold_low: self.threshold_low,
            threshold_high: self.threshold_high,
            chars: self.chars.clone(),
            font_ratio: self.font_ratio,
        }
    }
}

/// Default animation name for a video: the file stem without
/// non-alphanumeric characters.
///
/// ```rust
/// use rune_ascii_core::config::animation_name_from_path;
/// use std::path::Path;
///
/// assert_eq!(animation_name_from_path(Path::new("clips/spin-coin_v2.mp4")), "spincoinv2");
/// ```
pub fn animation_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| {
            stem.to_string_lossy()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect()
        })
        .unwrap_or_default()
}

/// Per-view playback settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerOptions {
    /// Overrides the bundle's frame rate.
    pub fps: Option<f64>,
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Caller's play flag; playback also waits on visibility and focus.
    pub playing: bool,
    /// Use the incremental renderer when the surface supports it.
    pub incremental: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            fps: None,
            looping: true,
            playing: true,
            incremental: true,
        }
    }
}

impl PlayerOptions {
    /// Frame rate to play at: the override, else the bundle's, else 30.
    pub fn resolve_fps(&self, bundle_fps: f64) -> f64 {
        [self.fps.unwrap_or(f64::NAN), bundle_fps]
            .into_iter()
            .find(|fps| fps.is_finite() && *fps > 0.0)
            .unwrap_or(crate::timing::DEFAULT_FPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_fps_fallbacks() {
        let mut options = PlayerOptions::default();
        assert_eq!(options.resolve_fps(12.0), 12.0);
        assert_eq!(options.resolve_fps(0.0), 30.0);
        options.fps = Some(60.0);
        assert_eq!(options.resolve_fps(12.0), 60.0);
        options.fps = Some(-1.0);
        assert_eq!(options.resolve_fps(12.0), 12.0);
    }

    #[test]
    fn player_options_json() {
        let options: PlayerOptions = serde_json::from_str(r#"{"loop":false,"fps":8}"#).unwrap();
        assert!(!options.looping);
        assert_eq!(options.fps, Some(8.0));
        assert!(options.playing);
    }

    #[test]
    fn defaults_are_valid() {
        let config = EncoderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ramp().unwrap().len(), 17);
        assert_eq!(config.color_mode(), ColorMode::Colored);
        assert_eq!(config.thresholds(), Thresholds::new(5, 235));
    }

    #[test]
    fn rejects_bad_settings() {
        let config = EncoderConfig {
            chars: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::EmptyGlyphRamp)));

        let config = EncoderConfig {
            fps: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidFps(_))));

        let config = EncoderConfig {
            columns: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidColumns)));

        let config = EncoderConfig {
            threshold_low: 200,
            threshold_high: 100,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidThresholds { low: 200, high: 100 })
        ));
    }

    #[test]
    fn generation_settings_mirror_config() {
        let config = EncoderConfig {
            chars: " .@".into(),
            font_ratio: 0.5,
            ..Default::default()
        };
        let settings = config.generation_settings();
        assert_eq!(settings.chars, " .@");
        assert_eq!(settings.threshold_low, 5);
        assert_eq!(settings.font_ratio, 0.5);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EncoderConfig::from_toml_str("fps = 24.0\nthresholdLow = 12\ncolored = false\n").unwrap();
        assert_eq!(config.fps, 24.0);
        assert_eq!(config.threshold_low, 12);
        assert!(!config.colored);
        assert_eq!(config.columns, 90);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn invalid_toml_config_rejected() {
        assert!(EncoderConfig::from_toml_str("chars = \"\"").is_err());
    }
}
