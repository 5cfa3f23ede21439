//! Typed error types for linebar-render.
//!
//! Rendering never fails because of the text itself: malformed UTF-8 and
//! missing glyphs are absorbed by the compositor. Only frame and layer
//! allocation can fail, and then no buffer must be submitted.

use thiserror::Error;

/// Failures while producing a frame.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The shared-memory file could not be created, sized or mapped.
    #[error("Frame allocation failed ({stage}): {source}")]
    AllocationFailed {
        /// Which step failed (`memfd_create`, `ftruncate`, `mmap`)
        stage: &'static str,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The surface has not been given a usable size yet.
    #[error("Cannot allocate a frame for empty geometry {width}x{height}")]
    EmptyGeometry {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },

    /// A scratch layer could not be allocated.
    #[error("Failed to allocate a {width}x{height} drawing layer")]
    Layer {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },

    /// The mapped region could not be viewed as 32-bit pixels.
    #[error("Mapped frame is not usable as ARGB pixels: {0}")]
    PixelView(String),
}

impl RenderError {
    /// Whether this is a resource failure rather than a caller error.
    pub fn is_allocation_failure(&self) -> bool {
        matches!(
            self,
            RenderError::AllocationFailed { .. }
                | RenderError::Layer { .. }
                | RenderError::PixelView(_)
        )
    }
}
