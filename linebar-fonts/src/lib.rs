//! Glyph source for the linebar text bar.
//!
//! This crate provides:
//! - The [`GlyphSource`] contract used by the compositor: font metrics,
//!   per-code-point rasterization and pair kerning
//! - fcft-style font descriptor parsing (`"Family:size=11"`)
//! - [`SwashFont`], a system-font implementation built on fontdb for
//!   discovery, swash for rasterization and rustybuzz for kerning
//!
//! # Architecture
//!
//! A font is resolved once at startup from its descriptor and kept for the
//! lifetime of the process. Rasterized glyphs and kerning pairs are cached
//! in LRU caches since a clock-like source redraws the same few characters
//! over and over.

mod descriptor;
mod error;
pub mod font_manager;
mod glyph;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use descriptor::{DEFAULT_POINT_SIZE, FontDescriptor, FontSize};
pub use error::FontError;
pub use font_manager::{FontData, SwashFont};
pub use glyph::{FontMetrics, Glyph, GlyphSource};
