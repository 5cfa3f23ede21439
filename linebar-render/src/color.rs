//! Packed ARGB8888 pixels.
//!
//! Frames hold `u32` values laid out as `0xAARRGGBB` with every colour
//! channel already scaled by alpha. Drawing happens on `tiny_skia` pixmaps,
//! which keep the same premultiplied channels in RGBA order.

use tiny_skia::{ColorU8, PremultipliedColorU8};

/// Pack a premultiplied pixmap pixel as `0xAARRGGBB`.
#[inline]
pub fn pack_argb(px: PremultipliedColorU8) -> u32 {
    (u32::from(px.alpha()) << 24)
        | (u32::from(px.red()) << 16)
        | (u32::from(px.green()) << 8)
        | u32::from(px.blue())
}

/// Unpack `0xAARRGGBB`. `None` if a colour channel exceeds alpha, which no
/// premultiplied pixel can.
#[inline]
pub fn unpack_argb(pixel: u32) -> Option<PremultipliedColorU8> {
    let [a, r, g, b] = pixel.to_be_bytes();
    PremultipliedColorU8::from_rgba(r, g, b, a)
}

/// Convert a straight-alpha `[R, G, B, A]` colour to a premultiplied pixel.
pub fn premultiply(rgba: [u8; 4]) -> u32 {
    let [r, g, b, a] = rgba;
    pack_argb(ColorU8::from_rgba(r, g, b, a).premultiply())
}

/// Convert a premultiplied pixel back to straight-alpha `[R, G, B, A]`.
pub fn unpremultiply(pixel: u32) -> [u8; 4] {
    match unpack_argb(pixel) {
        Some(px) if px.alpha() > 0 => {
            let c = px.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        }
        _ => [0, 0, 0, 0],
    }
}
