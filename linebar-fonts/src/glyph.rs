//! The glyph contract shared by every font implementation.

use std::sync::Arc;

/// Vertical font metrics in whole pixels.
///
/// Both values are positive distances from the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    /// Distance from the baseline to the top of the line
    pub ascent: i32,
    /// Distance from the baseline to the bottom of the line
    pub descent: i32,
}

impl FontMetrics {
    /// Height of a line that fits every glyph: `ascent + descent`.
    pub fn line_height(&self) -> u32 {
        u32::try_from(self.ascent + self.descent).unwrap_or(0)
    }
}

/// A rasterized glyph as an 8-bit coverage mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    /// Mask width in pixels
    pub width: u32,
    /// Mask height in pixels
    pub height: u32,
    /// Horizontal offset of the mask's left edge from the pen position
    pub x: i32,
    /// Vertical offset of the mask's top edge above the baseline
    pub y: i32,
    /// Pen advance after drawing this glyph
    pub advance: (i32, i32),
    /// Row-major coverage values, `width * height` bytes
    pub coverage: Vec<u8>,
}

impl Glyph {
    /// A glyph that draws nothing but still advances the pen (e.g. a space).
    pub fn blank(advance: i32) -> Self {
        Self {
            width: 0,
            height: 0,
            x: 0,
            y: 0,
            advance: (advance, 0),
            coverage: Vec::new(),
        }
    }
}

/// Something that turns code points into glyph bitmaps.
///
/// Implementations may cache, hence `&mut self`.
pub trait GlyphSource {
    /// Vertical metrics used for the baseline and automatic bar height.
    fn metrics(&self) -> FontMetrics;

    /// Rasterize one code point. `None` means the font has no glyph for it.
    fn rasterize(&mut self, ch: char) -> Option<Arc<Glyph>>;

    /// Horizontal adjustment in pixels between `left` and `right`.
    fn kerning(&mut self, left: char, right: char) -> i32;
}
