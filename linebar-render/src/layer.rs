//! Process-local drawing layers.
//!
//! A [`Layer`] is a transparent `tiny_skia` pixmap. Glyph coverage becomes a
//! mask filled with the foreground paint, and everything is drawn with
//! source-over. Drawing is clipped to the destination, so offsets may be
//! negative or run past the edge.

use linebar_fonts::Glyph;
use tiny_skia::{
    BlendMode, FilterQuality, IntSize, Mask, Paint, Pixmap, PixmapPaint, Rect, Transform,
};

use crate::color::pack_argb;
use crate::error::RenderError;

const OVER: PixmapPaint = PixmapPaint {
    opacity: 1.0,
    blend_mode: BlendMode::SourceOver,
    quality: FilterQuality::Nearest,
};

/// A premultiplied scratch surface, initially fully transparent.
#[derive(Debug, Clone)]
pub struct Layer {
    pixmap: Pixmap,
}

impl Layer {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        Pixmap::new(width, height)
            .map(|pixmap| Self { pixmap })
            .ok_or(RenderError::Layer { width, height })
    }

    /// Fill a glyph's coverage with `paint`, top-left corner at `(x, y)`.
    pub fn draw_glyph(&mut self, paint: &Paint<'_>, glyph: &Glyph, x: i32, y: i32) {
        let Some(tinted) = tinted_glyph(paint, glyph) else {
            return;
        };
        self.pixmap
            .draw_pixmap(x, y, tinted.as_ref(), &OVER, Transform::identity(), None);
    }

    /// Draw this layer over `dst` with its top-left corner at `(x, y)`.
    pub fn draw_onto(&self, dst: &mut Layer, x: i32, y: i32) {
        dst.pixmap
            .draw_pixmap(x, y, self.pixmap.as_ref(), &OVER, Transform::identity(), None);
    }

    /// Copy the layer into row-major ARGB8888 pixels of the same size.
    pub fn write_argb(&self, dst: &mut [u32]) {
        for (out, px) in dst.iter_mut().zip(self.pixmap.pixels()) {
            *out = pack_argb(*px);
        }
    }
}

/// The glyph's coverage filled with `paint`; `None` for an empty glyph.
fn tinted_glyph(paint: &Paint<'_>, glyph: &Glyph) -> Option<Pixmap> {
    let size = IntSize::from_wh(glyph.width, glyph.height)?;
    let mask = Mask::from_vec(glyph.coverage.clone(), size)?;
    let rect = Rect::from_xywh(0.0, 0.0, glyph.width as f32, glyph.height as f32)?;
    let mut pixmap = Pixmap::new(glyph.width, glyph.height)?;
    pixmap.fill_rect(rect, paint, Transform::identity(), Some(&mask));
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint(rgba: [u8; 4]) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
        paint.anti_alias = false;
        paint
    }

    fn argb(layer: &Layer) -> Vec<u32> {
        let mut out = vec![0; layer.pixmap.pixels().len()];
        layer.write_argb(&mut out);
        out
    }

    fn solid_glyph(width: u32, height: u32) -> Glyph {
        Glyph {
            width,
            height,
            x: 0,
            y: height as i32,
            advance: (width as i32, 0),
            coverage: vec![255; (width * height) as usize],
        }
    }

    #[test]
    fn test_new_layer_is_transparent() {
        let layer = Layer::new(3, 2).unwrap();
        assert_eq!(argb(&layer), vec![0; 6]);
    }

    #[test]
    fn test_zero_sized_layer_is_an_error() {
        let err = Layer::new(0, 4).unwrap_err();
        assert!(matches!(err, RenderError::Layer { width: 0, height: 4 }));
        assert!(err.is_allocation_failure());
    }

    #[test]
    fn test_glyph_is_tinted_and_placed() {
        let mut layer = Layer::new(4, 4).unwrap();
        layer.draw_glyph(&paint([0x10, 0x20, 0x30, 0xff]), &solid_glyph(2, 2), 1, 1);
        let pixels = argb(&layer);
        assert_eq!(pixels[0], 0);
        assert_eq!(pixels[4 + 1], 0xff102030);
        assert_eq!(pixels[2 * 4 + 2], 0xff102030);
        assert_eq!(pixels[3 * 4 + 3], 0);
    }

    #[test]
    fn test_glyph_clips_negative_offset() {
        let mut layer = Layer::new(4, 4).unwrap();
        layer.draw_glyph(&paint([0xff; 4]), &solid_glyph(3, 3), -2, -2);
        let pixels = argb(&layer);
        assert_eq!(pixels[0], 0xffffffff);
        assert_eq!(pixels[1], 0);
        assert_eq!(pixels[4], 0);
    }

    #[test]
    fn test_glyph_fully_outside_is_noop() {
        let mut layer = Layer::new(4, 4).unwrap();
        layer.draw_glyph(&paint([0xff; 4]), &solid_glyph(3, 3), 10, 0);
        layer.draw_glyph(&paint([0xff; 4]), &solid_glyph(3, 3), 0, -3);
        assert!(argb(&layer).iter().all(|&p| p == 0));
    }

    #[test]
    fn test_empty_glyph_draws_nothing() {
        let mut layer = Layer::new(4, 4).unwrap();
        layer.draw_glyph(&paint([0xff; 4]), &solid_glyph(0, 0), 0, 0);
        assert!(argb(&layer).iter().all(|&p| p == 0));
    }

    #[test]
    fn test_partial_coverage_blends() {
        let mut layer = Layer::new(1, 1).unwrap();
        let glyph = Glyph {
            coverage: vec![128],
            ..solid_glyph(1, 1)
        };
        layer.draw_glyph(&paint([0xff; 4]), &glyph, 0, 0);
        let alpha = argb(&layer)[0] >> 24;
        assert!(alpha.abs_diff(0x80) <= 1, "alpha {alpha:#x}");
    }

    #[test]
    fn test_draw_onto_with_offset_clips() {
        let mut src = Layer::new(4, 1).unwrap();
        src.draw_glyph(&paint([0, 0, 0xff, 0xff]), &solid_glyph(4, 1), 0, 0);

        let mut dst = Layer::new(4, 1).unwrap();
        src.draw_onto(&mut dst, 2, 0);
        assert_eq!(argb(&dst), vec![0, 0, 0xff0000ff, 0xff0000ff]);

        let mut dst = Layer::new(4, 1).unwrap();
        src.draw_onto(&mut dst, -3, 0);
        assert_eq!(argb(&dst), vec![0xff0000ff, 0, 0, 0]);
    }

    #[test]
    fn test_transparent_layer_keeps_destination() {
        let src = Layer::new(2, 2).unwrap();
        let mut dst = Layer::new(2, 2).unwrap();
        dst.draw_glyph(&paint([0x12, 0x34, 0x56, 0xff]), &solid_glyph(2, 2), 0, 0);
        src.draw_onto(&mut dst, 0, 0);
        assert!(argb(&dst).iter().all(|&p| p == 0xff123456));
    }
}
