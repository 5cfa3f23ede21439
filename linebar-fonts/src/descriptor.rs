//! fcft-style font descriptors.
//!
//! `Family[:size=<pt>][:pixelsize=<px>][:weight=bold][:slant=italic]`.
//! Unknown attributes are ignored with a warning so descriptors written for
//! fontconfig keep working.

use crate::error::FontError;
use std::str::FromStr;

/// Point size used when a descriptor names no size.
pub const DEFAULT_POINT_SIZE: f32 = 12.0;

/// Requested font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontSize {
    /// Typographic points, converted with the configured DPI
    Points(f32),
    /// Absolute pixel size
    Pixels(f32),
}

impl FontSize {
    /// Pixel size at the given resolution.
    pub fn to_pixels(self, dpi: f32) -> f32 {
        match self {
            FontSize::Points(pt) => pt * dpi / 72.0,
            FontSize::Pixels(px) => px,
        }
    }
}

/// A parsed font descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    /// Family name, or a generic family such as `monospace`
    pub family: String,
    pub size: FontSize,
    pub bold: bool,
    pub italic: bool,
}

impl FontDescriptor {
    /// Parse a descriptor string.
    pub fn parse(descriptor: &str) -> Result<Self, FontError> {
        let invalid = |reason: String| FontError::InvalidDescriptor {
            descriptor: descriptor.to_string(),
            reason,
        };

        let mut parts = descriptor.split(':');
        let family = parts.next().unwrap_or_default().trim();
        if family.is_empty() {
            return Err(invalid("missing font family".to_string()));
        }

        let mut parsed = FontDescriptor {
            family: family.to_string(),
            size: FontSize::Points(DEFAULT_POINT_SIZE),
            bold: false,
            italic: false,
        };

        for attr in parts.map(str::trim).filter(|a| !a.is_empty()) {
            let Some((key, value)) = attr.split_once('=') else {
                return Err(invalid(format!("attribute '{attr}' is not key=value")));
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "size" | "pixelsize" => {
                    let number: f32 = value
                        .parse()
                        .map_err(|_| invalid(format!("{key} '{value}' is not a number")))?;
                    if !number.is_finite() || number <= 0.0 {
                        return Err(invalid(format!("{key} must be positive, got {value}")));
                    }
                    parsed.size = if key == "size" {
                        FontSize::Points(number)
                    } else {
                        FontSize::Pixels(number)
                    };
                }
                "weight" | "style" if value.eq_ignore_ascii_case("bold") => parsed.bold = true,
                "weight" => parsed.bold = false,
                "slant" => {
                    parsed.italic = value.eq_ignore_ascii_case("italic")
                        || value.eq_ignore_ascii_case("oblique");
                }
                _ => log::warn!("Ignoring unsupported font attribute '{attr}' in '{descriptor}'"),
            }
        }

        Ok(parsed)
    }

    /// Pixel size at the given resolution.
    pub fn pixel_size(&self, dpi: f32) -> f32 {
        self.size.to_pixels(dpi)
    }
}

impl FromStr for FontDescriptor {
    type Err = FontError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
