//! Typed error types for linebar-fonts.

use thiserror::Error;

/// Failures while resolving the process-lifetime font.
#[derive(Debug, Error)]
pub enum FontError {
    /// The descriptor string could not be parsed.
    #[error("Invalid font descriptor '{descriptor}': {reason}")]
    InvalidDescriptor {
        /// The descriptor as given.
        descriptor: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Neither the requested family nor any monospace fallback is installed.
    #[error("No usable font found for family '{0}'")]
    NotFound(String),

    /// The face bytes were found but could not be parsed.
    #[error("Font data for '{0}' could not be parsed")]
    InvalidFontData(String),
}
