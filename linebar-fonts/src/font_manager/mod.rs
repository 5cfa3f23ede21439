//! System font resolution and the swash-backed [`GlyphSource`].
//!
//! The font is resolved once from its descriptor:
//! 1. The named family with the requested weight and slant
//! 2. For generic names (`monospace`, ...) or a missing family, the first
//!    installed monospace family
//!
//! Glyphs are rasterized with swash into 8-bit coverage masks and pair
//! kerning comes from shaping the two-character string with rustybuzz.

mod fallbacks;
mod loader;
mod types;

use std::num::NonZeroUsize;
use std::sync::Arc;

use fontdb::Database;
use lru::LruCache;
use swash::scale::image::{Content, Image};
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;

use crate::descriptor::FontDescriptor;
use crate::error::FontError;
use crate::glyph::{FontMetrics, Glyph, GlyphSource};

pub use fallbacks::{GENERIC_FAMILIES, MONOSPACE_FAMILIES};
pub use types::FontData;

const GLYPH_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(256).unwrap();
const KERNING_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(1024).unwrap();

/// A system font at a fixed pixel size.
pub struct SwashFont {
    font: FontData,
    /// Family that was actually loaded (may differ from the request)
    family: String,
    px_size: f32,
    metrics: FontMetrics,
    scale_context: ScaleContext,
    glyph_cache: LruCache<char, Option<Arc<Glyph>>>,
    kerning_cache: LruCache<(char, char), i32>,
}

impl std::fmt::Debug for SwashFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwashFont")
            .field("family", &self.family)
            .field("px_size", &self.px_size)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl SwashFont {
    /// Resolve a descriptor against the installed system fonts.
    pub fn load(descriptor: &FontDescriptor, dpi: f32) -> Result<Self, FontError> {
        let mut font_db = Database::new();
        font_db.load_system_fonts();
        log::info!("Loaded {} system fonts", font_db.len());
        Self::load_from_db(&font_db, descriptor, dpi)
    }

    /// Resolve a descriptor against an already populated database.
    pub fn load_from_db(
        font_db: &Database,
        descriptor: &FontDescriptor,
        dpi: f32,
    ) -> Result<Self, FontError> {
        let family = &descriptor.family;
        let (bold, italic) = (descriptor.bold, descriptor.italic);

        let requested = if loader::is_generic_family(family) {
            None
        } else {
            log::info!("Attempting to load font: {}", family);
            loader::load_font_from_db_with_style(font_db, family, bold, italic)
        };

        let (font, loaded_family) = match requested {
            Some(font) => (font, family.clone()),
            None => {
                if !loader::is_generic_family(family) {
                    log::warn!("Font '{}' not found, falling back to monospace", family);
                }
                let font = loader::load_monospace_fallback(font_db, bold, italic)
                    .ok_or_else(|| FontError::NotFound(family.clone()))?;
                (font, "monospace".to_string())
            }
        };

        let px_size = descriptor.pixel_size(dpi);
        log::info!("Using font '{}' at {:.1}px", loaded_family, px_size);
        Self::from_font_data(font, loaded_family, px_size)
    }

    /// Build from font bytes that are already in memory.
    pub fn from_font_data(
        font: FontData,
        family: impl Into<String>,
        px_size: f32,
    ) -> Result<Self, FontError> {
        let family = family.into();
        let scaled = font.font_ref().metrics(&[]).scale(px_size);
        if scaled.units_per_em == 0 {
            return Err(FontError::InvalidFontData(family));
        }
        let metrics = FontMetrics {
            ascent: scaled.ascent.round() as i32,
            descent: scaled.descent.round() as i32,
        };

        Ok(SwashFont {
            font,
            family,
            px_size,
            metrics,
            scale_context: ScaleContext::new(),
            glyph_cache: LruCache::new(GLYPH_CACHE_SIZE),
            kerning_cache: LruCache::new(KERNING_CACHE_SIZE),
        })
    }

    /// Family that was actually loaded.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Rendering size in pixels.
    pub fn px_size(&self) -> f32 {
        self.px_size
    }

    fn rasterize_uncached(&mut self, ch: char) -> Option<Glyph> {
        let font = self.font.font_ref();
        let glyph_id = font.charmap().map(ch);
        if glyph_id == 0 {
            log::trace!("No glyph for U+{:04X}", ch as u32);
            return None;
        }

        let advance = font
            .glyph_metrics(&[])
            .scale(self.px_size)
            .advance_width(glyph_id)
            .round() as i32;

        let mut scaler = self
            .scale_context
            .builder(font)
            .size(self.px_size)
            .hint(true)
            .build();

        // Color sources first so emoji fonts produce something; the coverage
        // is taken from their alpha channel.
        let image = Render::new(&[
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::ColorOutline(0),
            Source::Outline,
        ])
        .format(Format::Alpha)
        .render(&mut scaler, glyph_id);

        // Whitespace has no outline but must still advance the pen
        let Some(image) = image else {
            return Some(Glyph::blank(advance));
        };

        Some(Glyph {
            width: image.placement.width,
            height: image.placement.height,
            x: image.placement.left,
            y: image.placement.top,
            advance: (advance, 0),
            coverage: coverage_from_image(&image),
        })
    }

    fn kerning_uncached(&self, left: char, right: char) -> i32 {
        let Some(face) = rustybuzz::Face::from_slice(&self.font.data, self.font.face_index) else {
            return 0;
        };

        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(&format!("{left}{right}"));

        // Ligatures would merge the pair into one glyph
        let features = [
            rustybuzz::Feature::new(rustybuzz::ttf_parser::Tag::from_bytes(b"liga"), 0, ..),
            rustybuzz::Feature::new(rustybuzz::ttf_parser::Tag::from_bytes(b"clig"), 0, ..),
            rustybuzz::Feature::new(rustybuzz::ttf_parser::Tag::from_bytes(b"calt"), 0, ..),
        ];
        let shaped = rustybuzz::shape(&face, &features, buffer);
        let (infos, positions) = (shaped.glyph_infos(), shaped.glyph_positions());
        if infos.len() != 2 {
            return 0;
        }

        let font = self.font.font_ref();
        let units_per_em = font.metrics(&[]).units_per_em;
        if units_per_em == 0 {
            return 0;
        }
        let Ok(first) = u16::try_from(infos[0].glyph_id) else {
            return 0;
        };
        let nominal = font.glyph_metrics(&[]).advance_width(first);
        let kern_units = positions[0].x_advance as f32 - nominal;

        (kern_units * self.px_size / units_per_em as f32).round() as i32
    }
}

impl GlyphSource for SwashFont {
    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn rasterize(&mut self, ch: char) -> Option<Arc<Glyph>> {
        if let Some(cached) = self.glyph_cache.get(&ch) {
            return cached.clone();
        }
        let glyph = self.rasterize_uncached(ch).map(Arc::new);
        self.glyph_cache.put(ch, glyph.clone());
        glyph
    }

    fn kerning(&mut self, left: char, right: char) -> i32 {
        if let Some(&kern) = self.kerning_cache.get(&(left, right)) {
            return kern;
        }
        let kern = self.kerning_uncached(left, right);
        self.kerning_cache.put((left, right), kern);
        kern
    }
}

/// Reduce any swash image content to one coverage byte per pixel.
///
/// Subpixel masks come as 3 or 4 bytes per pixel depending on the swash
/// build; coverage is derived from the luminance of the RGB channels.
fn coverage_from_image(image: &Image) -> Vec<u8> {
    let pixel_count = image.placement.width as usize * image.placement.height as usize;
    if pixel_count == 0 {
        return Vec::new();
    }

    match image.content {
        Content::Mask => image.data.clone(),
        Content::Color => image.data.chunks_exact(4).map(|px| px[3]).collect(),
        Content::SubpixelMask => {
            let stride = image.data.len() / pixel_count;
            match stride {
                3 | 4 => image
                    .data
                    .chunks_exact(stride)
                    .map(|px| luminance(px[0], px[1], px[2]))
                    .collect(),
                // Unknown layout: opaque rather than invisible
                _ => vec![255; pixel_count],
            }
        }
    }
}

#[inline]
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_extremes() {
        assert_eq!(luminance(0, 0, 0), 0);
        assert_eq!(luminance(255, 255, 255), 255);
        assert!(luminance(0, 255, 0) > luminance(255, 0, 0));
    }

    #[test]
    fn test_generic_family_detection() {
        assert!(loader::is_generic_family("monospace"));
        assert!(loader::is_generic_family("Sans-Serif"));
        assert!(!loader::is_generic_family("Fira Code"));
    }

    #[test]
    fn test_empty_database_reports_not_found() {
        let font_db = Database::new();
        let descriptor = FontDescriptor::parse("Nonexistent Family:size=10").unwrap();
        let result = SwashFont::load_from_db(&font_db, &descriptor, 96.0);
        assert!(matches!(result, Err(FontError::NotFound(name)) if name == "Nonexistent Family"));
    }
}
