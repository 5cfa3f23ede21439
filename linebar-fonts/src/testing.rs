//! A deterministic box font for tests.
//!
//! Every character is a solid rectangle sitting on the baseline. The
//! coverage value is derived from the code point so different strings
//! produce different pixels.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::glyph::{FontMetrics, Glyph, GlyphSource};

/// Box font with configurable kerning pairs and missing characters.
#[derive(Debug, Clone)]
pub struct FixedGlyphSource {
    metrics: FontMetrics,
    advance: i32,
    kerning: HashMap<(char, char), i32>,
    missing: HashSet<char>,
    /// Every code point passed to `rasterize`, in call order
    pub rasterized: Vec<char>,
}

impl FixedGlyphSource {
    /// Boxes `advance - 2` wide and `ascent` tall, one pixel of side bearing.
    pub fn new(advance: i32) -> Self {
        Self {
            metrics: FontMetrics {
                ascent: 8,
                descent: 2,
            },
            advance,
            kerning: HashMap::new(),
            missing: HashSet::new(),
            rasterized: Vec::new(),
        }
    }

    pub fn with_metrics(mut self, ascent: i32, descent: i32) -> Self {
        self.metrics = FontMetrics { ascent, descent };
        self
    }

    pub fn with_kerning(mut self, left: char, right: char, kern: i32) -> Self {
        self.kerning.insert((left, right), kern);
        self
    }

    pub fn with_missing(mut self, ch: char) -> Self {
        self.missing.insert(ch);
        self
    }

    /// Advance of every glyph.
    pub fn advance(&self) -> i32 {
        self.advance
    }
}

impl Default for FixedGlyphSource {
    fn default() -> Self {
        Self::new(6)
    }
}

impl GlyphSource for FixedGlyphSource {
    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn rasterize(&mut self, ch: char) -> Option<Arc<Glyph>> {
        self.rasterized.push(ch);
        if self.missing.contains(&ch) {
            return None;
        }
        if ch == ' ' {
            return Some(Arc::new(Glyph::blank(self.advance)));
        }

        let width = u32::try_from(self.advance - 2).unwrap_or(0);
        let height = u32::try_from(self.metrics.ascent).unwrap_or(0);
        let value = 128 + (ch as u32 % 128) as u8;
        Some(Arc::new(Glyph {
            width,
            height,
            x: 1,
            y: self.metrics.ascent,
            advance: (self.advance, 0),
            coverage: vec![value; (width * height) as usize],
        }))
    }

    fn kerning(&mut self, left: char, right: char) -> i32 {
        self.kerning.get(&(left, right)).copied().unwrap_or(0)
    }
}
