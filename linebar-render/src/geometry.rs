//! Surface geometry.

/// Bytes per ARGB8888 pixel.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Size of the surface the bar is drawn into.
///
/// Only a surface reconfiguration replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceGeometry {
    pub width: u32,
    pub height: u32,
    /// Bytes per row (`width * 4`)
    pub stride: u32,
    /// Bytes in one frame (`stride * height`)
    pub buffer_size: usize,
}

impl SurfaceGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width.saturating_mul(BYTES_PER_PIXEL);
        Self {
            width,
            height,
            stride,
            buffer_size: stride as usize * height as usize,
        }
    }

    /// True until the surface has been configured with a non-zero size.
    pub fn is_empty(&self) -> bool {
        self.buffer_size == 0
    }

    /// Number of pixels in one frame.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
