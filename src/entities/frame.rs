//! Timeline frame: one still image reference plus its timing and flags.
//!
//! A frame never owns pixels. `source` points at the original file (or at a
//! materialized PNG for frames that came from an imported GIF) and is resolved
//! through the raster loader every time pixels are needed.

use std::path::{Path, PathBuf};

/// Shortest duration a frame may carry (ms)
pub const MIN_DURATION_MS: u32 = 10;

/// Longest duration a frame may carry (ms)
pub const MAX_DURATION_MS: u32 = 60_000;

/// Clamp a requested duration into the valid frame range.
pub fn clamp_duration(ms: u32) -> u32 {
    ms.clamp(MIN_DURATION_MS, MAX_DURATION_MS)
}

/// Single timeline entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Original image data; may vanish if deleted externally
    pub source: PathBuf,
    /// Row label, not unique
    pub display_name: String,
    /// Used for playback and export regardless of `is_custom_duration`
    pub duration_ms: u32,
    /// Pinned: bulk default-duration updates skip this frame
    pub is_custom_duration: bool,
    /// Member of the export subset
    pub is_checked: bool,
}

impl Frame {
    /// Create an unpinned, unchecked frame.
    pub fn new(source: impl Into<PathBuf>, display_name: impl Into<String>, duration_ms: u32) -> Self {
        Self {
            source: source.into(),
            display_name: display_name.into(),
            duration_ms: clamp_duration(duration_ms),
            is_custom_duration: false,
            is_checked: false,
        }
    }

    /// Frame named after the file it points at.
    pub fn from_path(path: &Path, duration_ms: u32) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(path, name, duration_ms)
    }

    /// Copy with `_copy` suffix on the label; flags and timing are kept.
    pub fn duplicate(&self) -> Self {
        Self {
            display_name: format!("{}_copy", self.display_name),
            ..self.clone()
        }
    }

    /// Whether the source still exists on disk
    pub fn source_exists(&self) -> bool {
        self.source.exists()
    }
}
