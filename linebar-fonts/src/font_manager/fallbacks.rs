//! Families tried for generic names and when the requested family is missing.

/// Generic family names understood in descriptors.
pub const GENERIC_FAMILIES: &[&str] = &["monospace", "mono", "sans-serif", "sans", "serif"];

/// Monospace families in priority order.
///
/// fontdb's built-in generic mapping points at Windows fonts, so on Linux
/// the generic `monospace` family is resolved through this list instead.
pub const MONOSPACE_FAMILIES: &[&str] = &[
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Noto Sans Mono",
    "JetBrains Mono",
    "Fira Code",
    "Hack",
    "Ubuntu Mono",
    "Source Code Pro",
    "Menlo",
    "Consolas",
    "Courier New",
];
