//! Background detection and luminance range derivation.
//!
//! Each frame is classified as sitting on a light or a dark background.
//! Pixels on the background side of the configured threshold are rendered
//! blank; the remaining pixels are spread over the glyph ramp using the
//! luminance range computed here.

use crate::parser::PixelSample;

/// Number of row-0 pixels the default detector averages.
pub const BACKGROUND_SAMPLE_SIZE: usize = 10;

/// Mean luminance above which a sampled border counts as a light background.
pub const LIGHT_BACKGROUND_LUMINANCE: f64 = 200.0;

/// Integer-truncated ITU-R BT.709 luminance.
///
/// ```rust
/// use rune_ascii_core::classify::luminance;
///
/// assert_eq!(luminance(250, 250, 250), 250);
/// assert_eq!(luminance(255, 0, 0), 54);
/// ```
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    (0.2126 * r as f64 + 0.7152 * g as f64 + 0.0722 * b as f64).floor() as u8
}

/// Which side of the luminance scale the frame's background sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Background {
    Light,
    Dark,
}

/// Strategy for deciding a frame's background.
///
/// The default [`FirstRowDetector`] assumes row 0 is mostly border. Other
/// heuristics (corner sampling, histogram mode) can be plugged into
/// [`classify_with`] without touching the quantizer.
pub trait BackgroundDetector {
    fn detect(&self, samples: &[PixelSample]) -> Background;
}

/// Averages the first [`BACKGROUND_SAMPLE_SIZE`] pixels of row 0.
///
/// Frames without any row-0 pixel are treated as dark.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstRowDetector;

impl BackgroundDetector for FirstRowDetector {
    fn detect(&self, samples: &[PixelSample]) -> Background {
        let (total, count) = samples
            .iter()
            .filter(|p| p.row == 0)
            .take(BACKGROUND_SAMPLE_SIZE)
            .fold((0u32, 0u32), |(total, count), p| {
                (total + luminance(p.r, p.g, p.b) as u32, count + 1)
            });

        if count > 0 && total as f64 / count as f64 > LIGHT_BACKGROUND_LUMINANCE {
            Background::Light
        } else {
            Background::Dark
        }
    }
}

/// Luminance thresholds separating background from content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
    /// On dark backgrounds, pixels darker than this are blank.
    pub low: u8,
    /// On light backgrounds, pixels lighter than this are blank.
    pub high: u8,
}

impl Thresholds {
    pub fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }
}

/// Result of classifying one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub background: Background,
    pub thresholds: Thresholds,
    /// Luminance mapped to the first glyph of the ramp.
    pub floor: u8,
    /// Luminance mapped to the last glyph of the ramp.
    pub ceil: u8,
}

impl Classification {
    /// Width of the mapped luminance range, never zero.
    #[inline]
    pub fn range(&self) -> u32 {
        (self.ceil as i32 - self.floor as i32).max(1) as u32
    }

    /// Whether a pixel of the given luminance is background (rendered blank).
    #[inline]
    pub fn is_blank(&self, lum: u8) -> bool {
        match self.background {
            Background::Dark => lum < self.thresholds.low,
            Background::Light => lum > self.thresholds.high,
        }
    }
}

/// Classify a frame using the default row-0 heuristic.
///
/// ## Example
///
/// ```rust
/// use rune_ascii_core::classify::{classify, Background, Thresholds};
/// use rune_ascii_core::PixelSample;
///
/// let samples = [
///     PixelSample::new(0, 0, 10, 10, 10),
///     PixelSample::new(0, 1, 250, 250, 250),
/// ];
/// let class = classify(&samples, Thresholds::new(5, 235));
/// assert_eq!(class.background, Background::Dark);
/// assert_eq!((class.floor, class.ceil), (5, 250));
/// ```
pub fn classify(samples: &[PixelSample], thresholds: Thresholds) -> Classification {
    classify_with(&FirstRowDetector, samples, thresholds)
}

/// Classify a frame with an explicit background detector.
pub fn classify_with<D: BackgroundDetector + ?Sized>(
    detector: &D,
    samples: &[PixelSample],
    thresholds: Thresholds,
) -> Classification {
    let background = detector.detect(samples);
    let mut class = Classification {
        background,
        thresholds,
        floor: 0,
        ceil: 0,
    };

    match background {
        Background::Dark => {
            let content_max = samples
                .iter()
                .map(|p| luminance(p.r, p.g, p.b))
                .filter(|&lum| !class.is_blank(lum))
                .max()
                .unwrap_or(u8::MAX);
            class.floor = thresholds.low;
            class.ceil = content_max;
        }
        Background::Light => {
            class.floor = 0;
            class.ceil = thresholds.high;
        }
    }

    class
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(row: u32, values: &[u8]) -> Vec<PixelSample> {
        values
            .iter()
            .enumerate()
            .map(|(col, &v)| PixelSample::gray(row, col as u32, v))
            .collect()
    }

    #[test]
    fn test_luminance_coefficients() {
        assert_eq!(luminance(0, 0, 0), 0);
        // evaluated in f64 like the reference encoder, so pure white truncates
        assert_eq!(luminance(255, 255, 255), 254);
        assert_eq!(luminance(0, 255, 0), 182);
        assert_eq!(luminance(0, 0, 255), 18);
    }

    #[test]
    fn test_dark_background_range() {
        let mut samples = row(0, &[0, 0, 0]);
        samples.extend(row(1, &[0, 120, 180]));
        let class = classify(&samples, Thresholds::new(5, 235));

        assert_eq!(class.background, Background::Dark);
        assert_eq!(class.floor, 5);
        assert_eq!(class.ceil, 180);
        assert_eq!(class.range(), 175);
        assert!(class.is_blank(4));
        assert!(!class.is_blank(5));
    }

    #[test]
    fn test_light_background_range() {
        let mut samples = row(0, &[250, 255, 240]);
        samples.extend(row(1, &[10, 100, 250]));
        let class = classify(&samples, Thresholds::new(5, 235));

        assert_eq!(class.background, Background::Light);
        assert_eq!((class.floor, class.ceil), (0, 235));
        assert!(class.is_blank(236));
        assert!(!class.is_blank(235));
    }

    #[test]
    fn test_mean_exactly_200_is_dark() {
        let samples = row(0, &[200, 200]);
        let class = classify(&samples, Thresholds::new(5, 235));
        assert_eq!(class.background, Background::Dark);
    }

    #[test]
    fn test_only_first_ten_row_zero_pixels_vote() {
        let mut values = vec![255u8; 10];
        values.extend([0u8; 20]);
        let class = classify(&row(0, &values), Thresholds::new(5, 235));
        assert_eq!(class.background, Background::Light);
    }

    #[test]
    fn test_all_background_frame_uses_full_range() {
        let samples = row(0, &[0, 1, 2, 3]);
        let class = classify(&samples, Thresholds::new(5, 235));
        assert_eq!(class.ceil, 255);
        assert_eq!(class.range(), 250);
    }

    #[test]
    fn test_flat_content_range_never_zero() {
        let samples = row(0, &[100, 100, 100]);
        let class = classify(&samples, Thresholds::new(100, 235));
        assert_eq!((class.floor, class.ceil), (100, 100));
        assert_eq!(class.range(), 1);
    }

    #[test]
    fn test_empty_frame_is_dark() {
        let class = classify(&[], Thresholds::new(5, 235));
        assert_eq!(class.background, Background::Dark);
    }

    #[test]
    fn test_custom_detector() {
        struct AlwaysLight;
        impl BackgroundDetector for AlwaysLight {
            fn detect(&self, _: &[PixelSample]) -> Background {
                Background::Light
            }
        }

        let class = classify_with(&AlwaysLight, &row(0, &[0]), Thresholds::new(5, 200));
        assert_eq!(class.background, Background::Light);
        assert_eq!(class.ceil, 200);
    }
}
