//! Text compositor for the linebar text bar.
//!
//! Turns one line of (possibly malformed) UTF-8 into a premultiplied ARGB
//! frame in shared memory:
//!
//! - [`utf8`]: a byte-at-a-time decoder with an explicit accept state
//! - [`layer`]: `tiny_skia` scratch layers, glyph masks and source-over
//!   compositing
//! - [`shm`]: memfd-backed frames that are unmapped before handoff
//! - [`compositor`]: baseline layout, kerning, centering and the final
//!   composite onto the shared frame

pub mod color;
pub mod compositor;
mod error;
pub mod geometry;
pub mod layer;
pub mod shm;
pub mod utf8;

pub use color::premultiply;
pub use compositor::{GlyphRun, LineLayout, PositionedGlyph, TextCompositor, draw_offset};
pub use error::RenderError;
pub use geometry::SurfaceGeometry;
pub use layer::Layer;
pub use shm::{BufferId, RenderBuffer};
