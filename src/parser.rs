//! Textual pixel dump parsing.
//!
//! The frame extractor hands over one text dump per frame: a header line
//! followed by one line per pixel, e.g.
//!
//! ```text
//! # ImageMagick pixel enumeration: 2,1,0,255,srgb
//! 0,0: (10,10,10)  #0A0A0A  srgb(10,10,10)
//! 1,0: (250,250,250)  #FAFAFA  srgb(250,250,250)
//! ```
//!
//! Grayscale dumps carry a single channel, `0,0: (128)`.

/// One pixel of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelSample {
    pub row: u32,
    pub col: u32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PixelSample {
    /// Create a sample from explicit channel values.
    pub fn new(row: u32, col: u32, r: u8, g: u8, b: u8) -> Self {
        Self { row, col, r, g, b }
    }

    /// Create a grayscale sample (`r == g == b`).
    pub fn gray(row: u32, col: u32, value: u8) -> Self {
        Self::new(row, col, value, value, value)
    }
}

/// Parse a pixel dump into samples, in dump order.
///
/// The first line is always treated as a header. Lines that match neither
/// the RGB nor the grayscale form are skipped; an empty result is a valid
/// all-background frame, not an error.
///
/// ## Example
///
/// ```rust
/// use rune_ascii_core::parse_pixel_dump;
///
/// let dump = "# header\n0,0: (10,10,10)\n1,0: (250,250,250)\nnot a pixel\n0,1: (7)";
/// let samples = parse_pixel_dump(dump);
/// assert_eq!(samples.len(), 3);
/// assert_eq!((samples[1].col, samples[1].row, samples[1].r), (1, 0, 250));
/// assert_eq!((samples[2].r, samples[2].g, samples[2].b), (7, 7, 7));
/// ```
pub fn parse_pixel_dump(dump: &str) -> Vec<PixelSample> {
    dump.lines()
        .skip(1)
        .filter_map(|line| parse_pixel_line(line.trim()))
        .collect()
}

/// Parse a single `"<col>,<row>: (<r>,<g>,<b>[,...])"` or `"<col>,<row>: (<g>)"` line.
pub fn parse_pixel_line(line: &str) -> Option<PixelSample> {
    let (col, rest) = take_number(line)?;
    let rest = rest.strip_prefix(',')?;
    let (row, rest) = take_number(rest)?;
    let rest = rest.strip_prefix(':')?;

    if let Some((r, g, b)) = find_rgb(rest) {
        return Some(PixelSample::new(row, col, r, g, b));
    }
    find_gray(rest).map(|value| PixelSample::gray(row, col, value))
}

/// Leading run of ASCII digits as a number, plus the remainder.
fn take_number(s: &str) -> Option<(u32, &str)> {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(s.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    let value = s[..end].parse::<u32>().ok()?;
    Some((value, &s[end..]))
}

/// Channel values above 8 bits (16-bit dumps) saturate.
fn channel(value: u32) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

/// First `(<r>,<g>,<b>` group anywhere in the text; extra channels are ignored.
fn find_rgb(s: &str) -> Option<(u8, u8, u8)> {
    s.match_indices('(').find_map(|(i, _)| {
        let rest = &s[i + 1..];
        let (r, rest) = take_number(rest)?;
        let (g, rest) = take_number(rest.strip_prefix(',')?)?;
        let (b, _) = take_number(rest.strip_prefix(',')?)?;
        Some((channel(r), channel(g), channel(b)))
    })
}

/// First `(<g>)` group anywhere in the text.
fn find_gray(s: &str) -> Option<u8> {
    s.match_indices('(').find_map(|(i, _)| {
        let (value, rest) = take_number(&s[i + 1..])?;
        rest.starts_with(')').then(|| channel(value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb_line() {
        let sample = parse_pixel_line("3,7: (1,2,3)  #010203  srgb(1,2,3)").unwrap();
        assert_eq!(sample, PixelSample::new(7, 3, 1, 2, 3));
    }

    #[test]
    fn test_parse_rgba_line_ignores_alpha() {
        let sample = parse_pixel_line("0,0: (9,8,7,255)  #090807FF  srgba(9,8,7,1)").unwrap();
        assert_eq!(sample, PixelSample::new(0, 0, 9, 8, 7));
    }

    #[test]
    fn test_parse_gray_line() {
        let sample = parse_pixel_line("4,2: (128)  #808080  gray(128)").unwrap();
        assert_eq!(sample, PixelSample::gray(2, 4, 128));
    }

    #[test]
    fn test_skips_header_and_garbage() {
        let dump = "0,0: (1,1,1)\n\n  \ngarbage\n1,0 (5,5,5)\n2,0: ()\n3,0: (4,4,4)\n";
        let samples = parse_pixel_dump(dump);
        // header line "0,0: (1,1,1)" is skipped even though it parses
        assert_eq!(samples, vec![PixelSample::gray(0, 3, 4)]);
    }

    #[test]
    fn test_empty_dump_is_empty() {
        assert!(parse_pixel_dump("").is_empty());
        assert!(parse_pixel_dump("# only a header").is_empty());
    }

    #[test]
    fn test_fractional_values_are_not_parsed() {
        assert_eq!(parse_pixel_line("0,0: (1.5,2,3)"), None);
    }

    #[test]
    fn test_wide_channels_saturate() {
        let sample = parse_pixel_line("0,0: (65535,0,300)").unwrap();
        assert_eq!((sample.r, sample.g, sample.b), (255, 0, 255));
    }

    #[test]
    fn test_order_is_preserved() {
        let dump = "h\n1,0: (1,1,1)\n0,0: (2,2,2)\n0,1: (3,3,3)";
        let cols: Vec<u32> = parse_pixel_dump(dump).iter().map(|s| s.col).collect();
        assert_eq!(cols, vec![1, 0, 0]);
    }
}
