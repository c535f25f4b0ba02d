//! Property-based invariant tests for the encoding side.
//!
//! 1. Glyph index is non-decreasing in luminance.
//! 2. Colored rows carry exactly one color tag per character.
//! 3. Classification is a pure function of its input.
//! 4. Background depends only on row 0.
//! 5. Grid shape survives a JSON round trip.

use proptest::prelude::*;
use rune_ascii_core::bundle::{assemble, infer_grid, BundleParams};
use rune_ascii_core::classify::{classify, Background, Classification, Thresholds};
use rune_ascii_core::quantize::GlyphRamp;
use rune_ascii_core::{AnimationBundle, Encoder, EncoderConfig, Frame, FrameRow, GenerationSettings, PixelSample};

// ── Helpers ─────────────────────────────────────────────────────────────

fn grid_strategy() -> impl Strategy<Value = Vec<Vec<(u8, u8, u8)>>> {
    (1usize..6, 1usize..9).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(prop::collection::vec(any::<(u8, u8, u8)>(), cols), rows)
    })
}

fn dump_of(grid: &[Vec<(u8, u8, u8)>]) -> String {
    let mut dump = String::from("# ImageMagick pixel enumeration\n");
    for (row, pixels) in grid.iter().enumerate() {
        for (col, (r, g, b)) in pixels.iter().enumerate() {
            dump.push_str(&format!("{col},{row}: ({r},{g},{b})\n"));
        }
    }
    dump
}

fn samples_of(grid: &[Vec<(u8, u8, u8)>]) -> Vec<PixelSample> {
    grid.iter()
        .enumerate()
        .flat_map(|(row, pixels)| {
            pixels
                .iter()
                .enumerate()
                .map(move |(col, &(r, g, b))| PixelSample::new(row as u32, col as u32, r, g, b))
        })
        .collect()
}

fn thresholds_strategy() -> impl Strategy<Value = Thresholds> {
    (any::<u8>(), any::<u8>()).prop_map(|(a, b)| Thresholds::new(a.min(b), a.max(b)))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Quantization monotonicity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn glyph_index_non_decreasing(
        ramp_len in 1usize..24,
        floor in any::<u8>(),
        ceil in any::<u8>(),
        a in any::<u8>(),
        b in any::<u8>(),
        light in any::<bool>(),
    ) {
        let chars: String = "abcdefghijklmnopqrstuvwxyz".chars().take(ramp_len).collect();
        let ramp = GlyphRamp::new(&chars).unwrap();
        let class = Classification {
            background: if light { Background::Light } else { Background::Dark },
            thresholds: Thresholds::new(5, 235),
            floor,
            ceil,
        };
        let (lo, hi) = (a.min(b), a.max(b));
        let lo_idx = ramp.index_for(lo, &class);
        let hi_idx = ramp.index_for(hi, &class);
        prop_assert!(lo_idx <= hi_idx, "index({lo})={lo_idx} > index({hi})={hi_idx}");
        prop_assert!(hi_idx < ramp.len());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Color/text alignment
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn colored_rows_are_aligned(grid in grid_strategy()) {
        let encoder = Encoder::new(EncoderConfig::default()).unwrap();
        let frame = encoder.encode_frame(&dump_of(&grid));

        prop_assert_eq!(frame.height(), grid.len());
        for row in &frame.rows {
            prop_assert!(matches!(row, FrameRow::Colored(..)));
            prop_assert_eq!(row.colors().len(), row.text().chars().count());
            prop_assert!(row.is_aligned());
        }
    }

    #[test]
    fn blank_cells_have_empty_tags(grid in grid_strategy()) {
        let encoder = Encoder::new(EncoderConfig { chars: "#@".into(), ..EncoderConfig::default() }).unwrap();
        let frame = encoder.encode_frame(&dump_of(&grid));
        for row in &frame.rows {
            for (i, ch) in row.text().chars().enumerate() {
                if ch == ' ' {
                    prop_assert_eq!(row.color_at(i), "");
                } else {
                    prop_assert_eq!(row.color_at(i).len(), 6);
                }
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3-4. Classification determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn classification_is_pure(grid in grid_strategy(), thresholds in thresholds_strategy()) {
        let samples = samples_of(&grid);
        prop_assert_eq!(classify(&samples, thresholds), classify(&samples, thresholds));
    }

    #[test]
    fn background_depends_on_row_zero_only(
        grid in grid_strategy(),
        replacement in any::<(u8, u8, u8)>(),
        thresholds in thresholds_strategy(),
    ) {
        let mut altered = grid.clone();
        for row in altered.iter_mut().skip(1) {
            for pixel in row.iter_mut() {
                *pixel = replacement;
            }
        }
        prop_assert_eq!(
            classify(&samples_of(&grid), thresholds).background,
            classify(&samples_of(&altered), thresholds).background
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn grid_survives_json(rows in 1usize..6, cols in 1usize..10, count in 1usize..5, colored in any::<bool>()) {
        let row = |i: usize| {
            let text: String = std::iter::repeat('@').take(cols).collect();
            if colored {
                FrameRow::Colored(text, vec![format!("{:06x}", i); cols])
            } else {
                FrameRow::Plain(text)
            }
        };
        let frames: Vec<Frame> = (0..count).map(|_| Frame::new((0..rows).map(&row).collect())).collect();
        let bundle = assemble(frames, BundleParams {
            name: "prop".into(),
            fps: 30.0,
            colored,
            generated_with: GenerationSettings {
                threshold_low: 5,
                threshold_high: 235,
                chars: " .@".into(),
                font_ratio: 0.5,
            },
        }).unwrap();

        let parsed = AnimationBundle::from_json(&bundle.to_json().unwrap()).unwrap();
        prop_assert_eq!(infer_grid(&parsed.frames), (bundle.meta.rows, bundle.meta.columns));
        prop_assert_eq!((parsed.meta.rows, parsed.meta.columns), (rows, cols));
        prop_assert_eq!(parsed, bundle);
    }
}
