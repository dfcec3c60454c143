//! Resolved clipboard backend settings

/// Settings handed to the clipboard backend once configuration is merged.
///
/// The worker process inherits a copy at fork time, so changing settings after
/// the first write does not affect a worker that is already running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardSettings {
    /// X display name; `None` uses `$DISPLAY`
    pub display: Option<String>,
    /// Consecutive worker spawn attempts allowed before giving up
    pub max_spawn_retries: u32,
    /// Growth step, in bytes, of the locale charset conversion buffer
    pub conversion_chunk: usize,
}

impl ClipboardSettings {
    pub const DEFAULT_MAX_SPAWN_RETRIES: u32 = 3;
    pub const DEFAULT_CONVERSION_CHUNK: usize = 32;

    /// Settings targeting a specific display
    pub fn with_display(display: impl Into<String>) -> Self {
        Self {
            display: Some(display.into()),
            ..Self::default()
        }
    }
}

impl Default for ClipboardSettings {
    fn default() -> Self {
        Self {
            display: None,
            max_spawn_retries: Self::DEFAULT_MAX_SPAWN_RETRIES,
            conversion_chunk: Self::DEFAULT_CONVERSION_CHUNK,
        }
    }
}
