//! Resolving family names to face data through fontdb.

use super::fallbacks::{GENERIC_FAMILIES, MONOSPACE_FAMILIES};
use super::types::FontData;
use fontdb::{Database, Family, Query, Style, Weight};

/// Load a face for `family` with the requested style, if installed.
pub(crate) fn load_font_from_db_with_style(
    font_db: &Database,
    family: &str,
    bold: bool,
    italic: bool,
) -> Option<FontData> {
    let families = [Family::Name(family)];
    let query = Query {
        families: &families,
        weight: if bold { Weight::BOLD } else { Weight::NORMAL },
        style: if italic { Style::Italic } else { Style::Normal },
        ..Query::default()
    };
    let id = font_db.query(&query)?;
    load_face(font_db, id)
}

/// Load the first available monospace face.
///
/// Walks [`MONOSPACE_FAMILIES`] first, then any face fontdb flags as
/// monospaced.
pub(crate) fn load_monospace_fallback(
    font_db: &Database,
    bold: bool,
    italic: bool,
) -> Option<FontData> {
    for family in MONOSPACE_FAMILIES {
        if let Some(font_data) = load_font_from_db_with_style(font_db, family, bold, italic) {
            log::debug!("Resolved monospace fallback: {}", family);
            return Some(font_data);
        }
    }
    let face = font_db.faces().find(|face| face.monospaced)?;
    log::debug!("Resolved monospace fallback by flag: {:?}", face.families);
    load_face(font_db, face.id)
}

/// Whether `family` is a generic name rather than an installed family.
pub(crate) fn is_generic_family(family: &str) -> bool {
    GENERIC_FAMILIES
        .iter()
        .any(|generic| generic.eq_ignore_ascii_case(family))
}

fn load_face(font_db: &Database, id: fontdb::ID) -> Option<FontData> {
    font_db
        .with_face_data(id, |data, index| {
            FontData::new_with_index(data.to_vec(), index)
        })
        .flatten()
}
