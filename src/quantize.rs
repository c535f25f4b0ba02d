//! Glyph quantization: luminance buckets to ramp characters.

use std::collections::BTreeMap;

use crate::classify::{luminance, Classification};
use crate::color::hex_tag;
use crate::data::{Frame, FrameRow};
use crate::error::{Error, Result};
use crate::parser::PixelSample;

/// Glyph for background cells.
pub const BLANK: char = ' ';

/// Ordered set of glyphs, one per luminance bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphRamp {
    glyphs: Vec<char>,
}

impl GlyphRamp {
    /// Build a ramp from its characters. The ramp must not be empty.
    pub fn new(chars: &str) -> Result<Self> {
        let glyphs: Vec<char> = chars.chars().collect();
        if glyphs.is_empty() {
            return Err(Error::EmptyGlyphRamp);
        }
        Ok(Self { glyphs })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Glyph at a bucket index, clamped to the last glyph.
    #[inline]
    pub fn glyph(&self, index: usize) -> char {
        self.glyphs[index.min(self.glyphs.len() - 1)]
    }

    /// Bucket index for a content luminance within the classified range.
    ///
    /// Non-decreasing in `lum` for a fixed classification.
    pub fn index_for(&self, lum: u8, class: &Classification) -> usize {
        let last = (self.glyphs.len() - 1) as i64;
        let offset = lum as i64 - class.floor as i64;
        let idx = (offset * last).div_euclid(class.range() as i64);
        idx.clamp(0, last) as usize
    }
}

/// Output mode of the quantizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Text only; colors are never computed.
    Plain,
    /// Text plus one color tag per character.
    #[default]
    Colored,
}

/// Map one pixel to its glyph and color tag.
#[inline]
pub fn quantize_pixel(
    pixel: &PixelSample,
    class: &Classification,
    ramp: &GlyphRamp,
    mode: ColorMode,
) -> (char, String) {
    let lum = luminance(pixel.r, pixel.g, pixel.b);
    if class.is_blank(lum) {
        return (BLANK, String::new());
    }
    let glyph = ramp.glyph(ramp.index_for(lum, class));
    let color = match mode {
        ColorMode::Colored => hex_tag(pixel.r, pixel.g, pixel.b),
        ColorMode::Plain => String::new(),
    };
    (glyph, color)
}

/// Quantize a parsed frame into rows.
///
/// Rows are emitted in increasing row index; within a row, cells keep the
/// order the samples arrived in.
///
/// ## Example
///
/// ```rust
/// use rune_ascii_core::classify::{classify, Thresholds};
/// use rune_ascii_core::quantize::{quantize_frame, ColorMode, GlyphRamp};
/// use rune_ascii_core::{parse_pixel_dump, FrameRow};
///
/// let samples = parse_pixel_dump("# header\n0,0: (0,0,0)\n1,0: (250,250,250)");
/// let class = classify(&samples, Thresholds::new(5, 235));
/// let ramp = GlyphRamp::new(" .@").unwrap();
/// let frame = quantize_frame(&samples, &class, &ramp, ColorMode::Colored);
///
/// assert_eq!(
///     frame.rows,
///     vec![FrameRow::Colored(" @".into(), vec!["".into(), "fafafa".into()])]
/// );
/// ```
pub fn quantize_frame(
    samples: &[PixelSample],
    class: &Classification,
    ramp: &GlyphRamp,
    mode: ColorMode,
) -> Frame {
    let mut rows: BTreeMap<u32, (String, Vec<String>)> = BTreeMap::new();

    for pixel in samples {
        let (glyph, color) = quantize_pixel(pixel, class, ramp, mode);
        let (text, colors) = rows.entry(pixel.row).or_default();
        text.push(glyph);
        if mode == ColorMode::Colored {
            colors.push(color);
        }
    }

    let rows = rows
        .into_values()
        .map(|(text, colors)| match mode {
            ColorMode::Colored => FrameRow::Colored(text, colors),
            ColorMode::Plain => FrameRow::Plain(text),
        })
        .collect();

    Frame::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, Background, Thresholds};

    fn dark_class(floor: u8, ceil: u8) -> Classification {
        Classification {
            background: Background::Dark,
            thresholds: Thresholds::new(floor, 235),
            floor,
            ceil,
        }
    }

    #[test]
    fn test_empty_ramp_rejected() {
        assert!(matches!(GlyphRamp::new(""), Err(Error::EmptyGlyphRamp)));
    }

    #[test]
    fn test_index_spans_ramp() {
        let ramp = GlyphRamp::new(" .:-=+*#%@").unwrap();
        let class = dark_class(5, 255);
        assert_eq!(ramp.index_for(5, &class), 0);
        assert_eq!(ramp.index_for(255, &class), 9);
        // (130 - 5) * 9 / 250 = 4.5
        assert_eq!(ramp.index_for(130, &class), 4);
    }

    #[test]
    fn test_index_clamps_outside_range() {
        let ramp = GlyphRamp::new("ab").unwrap();
        let class = dark_class(100, 150);
        assert_eq!(ramp.index_for(0, &class), 0);
        assert_eq!(ramp.index_for(255, &class), 1);
    }

    #[test]
    fn test_single_glyph_ramp() {
        let ramp = GlyphRamp::new("#").unwrap();
        let class = dark_class(5, 200);
        assert_eq!(ramp.index_for(200, &class), 0);
        assert_eq!(ramp.glyph(7), '#');
    }

    #[test]
    fn test_reference_example() {
        let samples = [
            PixelSample::new(0, 0, 10, 10, 10),
            PixelSample::new(0, 1, 250, 250, 250),
        ];
        let class = classify(&samples, Thresholds::new(5, 235));
        let ramp = GlyphRamp::new(" .@").unwrap();
        assert_eq!(class.background, Background::Dark);
        assert_eq!(class.ceil, 250);

        let frame = quantize_frame(&samples, &class, &ramp, ColorMode::Colored);
        // luminance 9 clears the low threshold, so it lands on the first
        // (blank-looking) glyph but keeps its color
        assert_eq!(
            frame.rows,
            vec![FrameRow::Colored(
                " @".into(),
                vec!["0a0a0a".into(), "fafafa".into()]
            )]
        );
    }

    #[test]
    fn test_background_cells_have_no_color() {
        let samples = [
            PixelSample::gray(0, 0, 0),
            PixelSample::new(0, 1, 200, 10, 30),
        ];
        let class = classify(&samples, Thresholds::new(5, 235));
        let ramp = GlyphRamp::new(".#").unwrap();
        let frame = quantize_frame(&samples, &class, &ramp, ColorMode::Colored);
        assert_eq!(frame.rows[0].color_at(0), "");
        assert_eq!(frame.rows[0].color_at(1), "c80a1e");
    }

    #[test]
    fn test_plain_mode_emits_text_rows() {
        let samples = [
            PixelSample::gray(1, 0, 250),
            PixelSample::gray(0, 0, 0),
            PixelSample::gray(0, 1, 250),
            PixelSample::gray(1, 1, 0),
        ];
        let class = classify(&samples, Thresholds::new(5, 235));
        let ramp = GlyphRamp::new(" .@").unwrap();
        let frame = quantize_frame(&samples, &class, &ramp, ColorMode::Plain);
        assert_eq!(
            frame.rows,
            vec![FrameRow::Plain(" @".into()), FrameRow::Plain("@ ".into())]
        );
    }

    #[test]
    fn test_light_background_blanks_bright_pixels() {
        let samples: Vec<PixelSample> = [250, 250, 250, 250, 250, 0]
            .iter()
            .enumerate()
            .map(|(col, &v)| PixelSample::gray(0, col as u32, v))
            .collect();
        let class = classify(&samples, Thresholds::new(5, 235));
        assert_eq!(class.background, Background::Light);

        let ramp = GlyphRamp::new("@. ").unwrap();
        let frame = quantize_frame(&samples, &class, &ramp, ColorMode::Plain);
        assert_eq!(frame.rows[0].text(), "     @");
    }

    #[test]
    fn test_empty_samples_yield_empty_frame() {
        let class = classify(&[], Thresholds::new(5, 235));
        let ramp = GlyphRamp::new(" .@").unwrap();
        let frame = quantize_frame(&[], &class, &ramp, ColorMode::Colored);
        assert_eq!(frame.height(), 0);
    }
}
