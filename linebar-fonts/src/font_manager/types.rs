//! Font data types.

use std::sync::Arc;
use swash::{CacheKey, FontRef};

/// Owns font file bytes and hands out swash `FontRef`s borrowing them.
///
/// Only the face offset and cache key are stored, so no self-referential
/// borrow is needed to keep the face around.
#[derive(Clone)]
pub struct FontData {
    /// Raw font data bytes (TTF/OTF/TTC)
    pub data: Arc<Vec<u8>>,
    /// Face index within the data (non-zero only for collections)
    pub face_index: u32,
    offset: u32,
    key: CacheKey,
}

impl std::fmt::Debug for FontData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontData")
            .field("data_len", &self.data.len())
            .field("face_index", &self.face_index)
            .finish()
    }
}

impl FontData {
    /// Create a new FontData from bytes using face index 0.
    ///
    /// Returns `None` if the bytes are not a font swash can read.
    pub fn new(data: Vec<u8>) -> Option<Self> {
        Self::new_with_index(data, 0)
    }

    /// Create a new FontData from bytes with a specific face index.
    ///
    /// Needed for TrueType Collection (.ttc) files where several faces share
    /// the same data.
    pub fn new_with_index(data: Vec<u8>, face_index: u32) -> Option<Self> {
        let (offset, key) = {
            let font = FontRef::from_index(&data, face_index as usize)?;
            (font.offset, font.key)
        };
        Some(FontData {
            data: Arc::new(data),
            face_index,
            offset,
            key,
        })
    }

    /// Swash reference for glyph lookups and scaling.
    pub fn font_ref(&self) -> FontRef<'_> {
        FontRef {
            data: self.data.as_slice(),
            offset: self.offset,
            key: self.key,
        }
    }
}
