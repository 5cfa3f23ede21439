//! Default value functions referenced by `#[serde(default = ...)]`.

pub fn font() -> String {
    "monospace:size=11".to_string()
}

pub fn dpi() -> f32 {
    96.0
}

/// Light grey, fully opaque.
pub fn foreground() -> [u8; 4] {
    [0xb3, 0xb3, 0xb3, 0xff]
}

pub fn source_command() -> String {
    "date".to_string()
}

pub fn respawn_interval_ms() -> Option<u64> {
    Some(1000)
}
