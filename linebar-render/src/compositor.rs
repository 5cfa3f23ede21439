//! Single-line text compositor.
//!
//! Rendering a line:
//! 1. Allocate the shared frame (fails before any drawing)
//! 2. Walk the bytes with the streaming decoder, consuming `^` escapes
//! 3. Lay glyphs out from the baseline, applying pair kerning, and fill
//!    their coverage masks with the foreground paint on a foreground layer
//! 4. Centre horizontally, draw the background then the foreground layer
//!    over a transparent composite, and copy it into the frame as ARGB8888
//! 5. Unmap and hand back the frame

use std::sync::Arc;

use linebar_fonts::{Glyph, GlyphSource};
use tiny_skia::Paint;

use crate::color::premultiply;
use crate::error::RenderError;
use crate::geometry::SurfaceGeometry;
use crate::layer::Layer;
use crate::shm::{MappedFrame, RenderBuffer};
use crate::utf8::{Step, Utf8Decoder};

/// Byte that introduces an inline command.
///
/// No commands are defined: the marker is consumed and the following byte is
/// decoded as ordinary text, so `^^` renders a single `^`.
pub const ESCAPE_MARKER: u8 = b'^';

/// One item produced while walking a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEvent {
    /// A decoded code point to lay out
    Char(char),
    /// An inline command marker (currently without effect on layout)
    Escape,
}

/// Iterator over the code points and escape markers of a byte string.
#[derive(Debug)]
pub struct TextWalker<'a> {
    bytes: std::slice::Iter<'a, u8>,
    decoder: Utf8Decoder,
    escaped: bool,
}

impl<'a> TextWalker<'a> {
    pub fn new(text: &'a [u8]) -> Self {
        Self {
            bytes: text.iter(),
            decoder: Utf8Decoder::new(),
            escaped: false,
        }
    }

    /// True once the walk ended inside a sequence or hit invalid input.
    pub fn is_malformed(&self) -> bool {
        !self.decoder.is_accept()
    }
}

impl Iterator for TextWalker<'_> {
    type Item = TextEvent;

    fn next(&mut self) -> Option<TextEvent> {
        for &byte in self.bytes.by_ref() {
            if byte == ESCAPE_MARKER && !self.escaped && self.decoder.is_accept() {
                self.escaped = true;
                return Some(TextEvent::Escape);
            }
            self.escaped = false;
            match self.decoder.push(byte) {
                Step::Char(ch) => return Some(TextEvent::Char(ch)),
                Step::Incomplete => continue,
                // Nothing after an invalid sequence is decoded
                Step::Reject => return None,
            }
        }
        None
    }
}

/// A glyph placed on the line.
#[derive(Debug, Clone)]
pub struct PositionedGlyph {
    pub ch: char,
    /// Pen position (after kerning) where the glyph's origin sits
    pub position: (i32, i32),
    pub advance: (i32, i32),
    /// Furthest pen x reached once this glyph has been advanced past
    pub extent: i32,
    pub glyph: Arc<Glyph>,
}

impl PositionedGlyph {
    /// Top-left corner of the glyph's mask.
    pub fn draw_origin(&self) -> (i32, i32) {
        (
            self.position.0 + self.glyph.x,
            self.position.1 - self.glyph.y,
        )
    }
}

/// Glyphs of one line, left to right.
pub type GlyphRun = Vec<PositionedGlyph>;

/// Result of laying out one line.
#[derive(Debug, Clone)]
pub struct LineLayout {
    pub run: GlyphRun,
    /// Baseline y within the surface
    pub baseline: i32,
    /// Furthest pen x reached (the text width used for centering)
    pub max_x: i32,
    /// The text was not valid UTF-8; `run` holds the valid prefix
    pub malformed: bool,
}

/// Horizontal offset that centres text `max_x` wide in `width`.
///
/// Negative when the text is wider than the surface.
pub fn draw_offset(width: u32, max_x: i32) -> i32 {
    ((width as i64 - max_x as i64) / 2) as i32
}

/// Baseline that vertically centres the font's line box.
pub fn baseline(height: u32, ascent: i32, descent: i32) -> i32 {
    ((height as i64 + ascent as i64 - descent as i64) / 2) as i32
}

/// Lays out and draws lines with one font and one foreground colour.
#[derive(Debug)]
pub struct TextCompositor<G> {
    font: G,
    /// Straight-alpha `[R, G, B, A]` text colour
    foreground: [u8; 4],
}

impl<G: GlyphSource> TextCompositor<G> {
    /// `foreground` is straight-alpha `[R, G, B, A]`.
    pub fn new(font: G, foreground: [u8; 4]) -> Self {
        Self { font, foreground }
    }

    pub fn font(&self) -> &G {
        &self.font
    }

    /// Premultiplied foreground pixel.
    pub fn foreground(&self) -> u32 {
        premultiply(self.foreground)
    }

    fn paint(&self) -> Paint<'static> {
        let [r, g, b, a] = self.foreground;
        let mut paint = Paint::default();
        // tiny-skia premultiplies the solid colour itself
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = false;
        paint
    }

    /// Position every glyph of `text` for a surface `height` pixels tall.
    pub fn layout(&mut self, text: &[u8], height: u32) -> LineLayout {
        let metrics = self.font.metrics();
        let baseline = baseline(height, metrics.ascent, metrics.descent);

        let (mut xpos, mut ypos) = (0i32, baseline);
        let mut max_x = 0i32;
        let mut previous: Option<char> = None;
        let mut run = GlyphRun::new();

        let mut walker = TextWalker::new(text);
        for event in walker.by_ref() {
            let ch = match event {
                TextEvent::Char(ch) => ch,
                TextEvent::Escape => {
                    log::trace!("Inline command marker ignored");
                    continue;
                }
            };

            let Some(glyph) = self.font.rasterize(ch) else {
                continue;
            };

            if let Some(prev) = previous {
                xpos += self.font.kerning(prev, ch);
            }
            previous = Some(ch);

            let position = (xpos, ypos);
            xpos += glyph.advance.0;
            ypos += glyph.advance.1;
            max_x = max_x.max(xpos);

            run.push(PositionedGlyph {
                ch,
                position,
                advance: glyph.advance,
                extent: max_x,
                glyph,
            });
        }

        LineLayout {
            run,
            baseline,
            max_x,
            malformed: walker.is_malformed(),
        }
    }

    /// Render `text` centred into a fresh shared-memory frame.
    pub fn render(
        &mut self,
        text: &[u8],
        geometry: SurfaceGeometry,
    ) -> Result<RenderBuffer, RenderError> {
        let mut frame = MappedFrame::allocate(geometry)?;
        let background = Layer::new(geometry.width, geometry.height)?;
        let mut foreground = Layer::new(geometry.width, geometry.height)?;
        let mut composite = Layer::new(geometry.width, geometry.height)?;

        let layout = self.layout(text, geometry.height);
        if layout.malformed {
            log::warn!(
                "Malformed UTF-8 sequence in line, rendering the first {} glyphs",
                layout.run.len()
            );
        }

        let paint = self.paint();
        for placed in &layout.run {
            let (x, y) = placed.draw_origin();
            foreground.draw_glyph(&paint, &placed.glyph, x, y);
        }

        let xdraw = draw_offset(geometry.width, layout.max_x);
        background.draw_onto(&mut composite, xdraw, 0);
        foreground.draw_onto(&mut composite, xdraw, 0);
        composite.write_argb(frame.pixels_mut()?);

        log::trace!(
            "Rendered {} glyphs at {}x{} (xdraw {})",
            layout.run.len(),
            geometry.width,
            geometry.height,
            xdraw
        );
        Ok(frame.finish())
    }
}
