//! Character grid sizing for frame extraction.
//!
//! Character cells are taller than they are wide, so a frame scaled to
//! `columns` pixels wide must also be squashed vertically by the font
//! ratio before each pixel becomes one character.

/// Width and height of an animation's character grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSize {
    pub columns: u32,
    pub rows: u32,
}

impl GridSize {
    /// Grid for a source video of the given pixel size.
    ///
    /// The source is first scaled to `columns` wide keeping its aspect ratio
    /// (height rounded to an even number of pixels), then its height is
    /// multiplied by `font_ratio`.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use rune_ascii_core::sizing::GridSize;
    ///
    /// // 1920x1080 at 90 columns: 90x50 scaled, 50 * 0.44 = 22 rows
    /// let grid = GridSize::for_source(1920, 1080, 90, 0.44);
    /// assert_eq!(grid, GridSize { columns: 90, rows: 22 });
    /// ```
    pub fn for_source(source_width: u32, source_height: u32, columns: u32, font_ratio: f64) -> Self {
        let scaled = scaled_height(source_width, source_height, columns);
        let rows = (font_ratio * scaled as f64).round().max(0.0) as u32;
        Self { columns, rows }
    }

    /// Total number of character cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

/// Height of the source after scaling to `columns` wide, rounded to the
/// nearest even pixel count.
pub fn scaled_height(source_width: u32, source_height: u32, columns: u32) -> u32 {
    if source_width == 0 || source_height == 0 || columns == 0 {
        return 0;
    }
    let exact = columns as f64 * source_height as f64 / (source_width as f64 * 2.0);
    (exact.round() as u32).max(1) * 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_height_is_even() {
        assert_eq!(scaled_height(1920, 1080, 90), 50); // 50.625 -> 50
        assert_eq!(scaled_height(640, 480, 90), 68); // 67.5 -> 68
        assert_eq!(scaled_height(100, 100, 7), 8); // 7 -> 8
    }

    #[test]
    fn test_zero_dimensions() {
        assert_eq!(scaled_height(0, 1080, 90), 0);
        assert_eq!(GridSize::for_source(1920, 0, 90, 0.44).rows, 0);
    }

    #[test]
    fn test_square_source() {
        let grid = GridSize::for_source(500, 500, 100, 0.5);
        assert_eq!(grid, GridSize { columns: 100, rows: 50 });
        assert_eq!(grid.cell_count(), 5000);
    }
}
