//! Ordered frame list with cursor, default duration and animation mode.
//!
//! **Invariants** (hold after every public method):
//! - `cursor` is `Some(i)` with `i < len` when non-empty, `None` when empty
//! - every frame duration lies in [10, 60000]
//!
//! Insertion order is display and playback order. Edits mark the timeline
//! modified; cursor movement from playback or selection does not.

use std::path::{Path, PathBuf};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::frame::{clamp_duration, Frame};

/// Default frame duration for a fresh timeline (ms)
pub const DEFAULT_DURATION_MS: u32 = 100;

/// Playback direction policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnimationMode {
    /// Last frame wraps to the first
    #[default]
    Loop,
    /// Bounce between first and last frame
    Wave,
}

impl AnimationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationMode::Loop => "loop",
            AnimationMode::Wave => "wave",
        }
    }
}

impl std::fmt::Display for AnimationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable frame sequence (single source of truth for frames and cursor)
#[derive(Debug, Clone)]
pub struct Timeline {
    frames: Vec<Frame>,
    cursor: Option<usize>,
    default_duration_ms: u32,
    animation_mode: AnimationMode,
    /// Associated save location (set by a successful export or import)
    save_path: Option<PathBuf>,
    /// Unsaved-changes flag
    modified: bool,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MS, AnimationMode::Loop)
    }
}

impl Timeline {
    /// Empty timeline
    pub fn new(default_duration_ms: u32, animation_mode: AnimationMode) -> Self {
        Self {
            frames: Vec::new(),
            cursor: None,
            default_duration_ms: clamp_duration(default_duration_ms),
            animation_mode,
            save_path: None,
            modified: false,
        }
    }

    // === Read access ===

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Current frame index, `None` iff the timeline is empty
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Frame under the cursor
    pub fn current(&self) -> Option<&Frame> {
        self.cursor.and_then(|i| self.frames.get(i))
    }

    pub fn default_duration_ms(&self) -> u32 {
        self.default_duration_ms
    }

    pub fn animation_mode(&self) -> AnimationMode {
        self.animation_mode
    }

    pub fn save_path(&self) -> Option<&Path> {
        self.save_path.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Indices of checked frames in timeline order
    pub fn checked_indices(&self) -> Vec<usize> {
        self.frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_checked)
            .map(|(i, _)| i)
            .collect()
    }

    /// Duration shown in the duration column: what the frame actually plays for.
    pub fn display_duration(&self, index: usize) -> Option<u32> {
        self.frames.get(index).map(|f| f.duration_ms)
    }

    // === Edit operations ===

    /// Append a frame with the default duration. Returns its index.
    pub fn add(&mut self, source: impl Into<PathBuf>, display_name: impl Into<String>) -> usize {
        let frame = Frame::new(source, display_name, self.default_duration_ms);
        self.push(frame)
    }

    /// Append an already-built frame. Duration is clamped.
    pub fn push(&mut self, mut frame: Frame) -> usize {
        frame.duration_ms = clamp_duration(frame.duration_ms);
        trace!("Timeline add: {} ({} ms)", frame.display_name, frame.duration_ms);
        self.frames.push(frame);
        let index = self.frames.len() - 1;
        if self.cursor.is_none() {
            self.cursor = Some(index);
        }
        self.modified = true;
        index
    }

    /// Remove the frame at `index`. Out of range is a silent no-op.
    pub fn remove(&mut self, index: usize) -> Option<Frame> {
        if index >= self.frames.len() {
            return None;
        }
        let removed = self.frames.remove(index);
        self.cursor = match (self.cursor, self.frames.len()) {
            (_, 0) => None,
            (Some(c), len) => Some(c.min(len - 1)),
            (None, _) => Some(0),
        };
        self.modified = true;
        debug!("Timeline remove: {} -> {} frames left", removed.display_name, self.frames.len());
        Some(removed)
    }

    /// Insert a `_copy` of `index` right after it and move the cursor there.
    pub fn duplicate(&mut self, index: usize) -> Option<usize> {
        let copy = self.frames.get(index)?.duplicate();
        let new_index = index + 1;
        self.frames.insert(new_index, copy);
        self.cursor = Some(new_index);
        self.modified = true;
        Some(new_index)
    }

    /// Swap `index` with its neighbour in `direction` (negative = up, positive = down).
    ///
    /// Returns the frame's new index, `None` at the boundaries or for a zero direction.
    /// The cursor follows the moved frame.
    pub fn move_frame(&mut self, index: usize, direction: i32) -> Option<usize> {
        if index >= self.frames.len() {
            return None;
        }
        let target = match direction.signum() {
            -1 => index.checked_sub(1)?,
            1 if index + 1 < self.frames.len() => index + 1,
            _ => return None,
        };
        self.frames.swap(index, target);
        self.cursor = Some(target);
        self.modified = true;
        Some(target)
    }

    /// Set one frame's duration; pins it unless it equals the default.
    pub fn set_duration(&mut self, index: usize, ms: u32) -> bool {
        let default = self.default_duration_ms;
        let Some(frame) = self.frames.get_mut(index) else {
            return false;
        };
        frame.duration_ms = clamp_duration(ms);
        frame.is_custom_duration = frame.duration_ms != default;
        self.modified = true;
        true
    }

    /// Change the default and apply it to every unpinned frame.
    pub fn set_default_duration(&mut self, ms: u32) {
        let ms = clamp_duration(ms);
        self.default_duration_ms = ms;
        for frame in self.frames.iter_mut().filter(|f| !f.is_custom_duration) {
            frame.duration_ms = ms;
        }
        self.modified = true;
    }

    /// Overwrite every frame's duration and unpin all of them.
    pub fn force_uniform_duration(&mut self, ms: u32) {
        let ms = clamp_duration(ms);
        for frame in &mut self.frames {
            frame.duration_ms = ms;
            frame.is_custom_duration = false;
        }
        self.modified = true;
    }

    /// Flip the export-subset flag of one frame.
    pub fn toggle_checked(&mut self, index: usize) -> Option<bool> {
        let frame = self.frames.get_mut(index)?;
        frame.is_checked = !frame.is_checked;
        self.modified = true;
        Some(frame.is_checked)
    }

    /// Set the export-subset flag of one frame. Returns false if there is no such frame.
    pub fn set_checked(&mut self, index: usize, checked: bool) -> bool {
        let Some(frame) = self.frames.get_mut(index) else {
            return false;
        };
        if frame.is_checked != checked {
            frame.is_checked = checked;
            self.modified = true;
        }
        true
    }

    pub fn set_animation_mode(&mut self, mode: AnimationMode) {
        if self.animation_mode != mode {
            self.animation_mode = mode;
            self.modified = true;
        }
    }

    // === Cursor / session state (not edits) ===

    /// Move the cursor to a selected row. Out of range is ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.frames.len() {
            self.cursor = Some(index);
            true
        } else {
            false
        }
    }

    /// Cursor write used by the playback scheduler.
    pub(crate) fn set_cursor(&mut self, index: usize) {
        if index < self.frames.len() {
            self.cursor = Some(index);
        }
    }

    pub fn set_save_path(&mut self, path: Option<PathBuf>) {
        self.save_path = path;
    }

    /// Clear the unsaved-changes flag (after save or fresh load).
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Overwrite the default without touching frames (import post-pass).
    pub(crate) fn adopt_default_duration(&mut self, ms: u32) {
        self.default_duration_ms = clamp_duration(ms);
    }

    pub(crate) fn frames_mut(&mut self) -> &mut [Frame] {
        &mut self.frames
    }
}
