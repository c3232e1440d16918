//! Project: the editing session around one Timeline.
//!
//! Owns the Timeline, the Player driving its cursor, and the directory that
//! backs frames materialized from an imported GIF. Destructive replacements
//! (new project, open) go through the discard guard first.
//!
//! The import directory is a `TempDir`: it is removed when a later import or
//! `new_project` replaces it, or when the Project is dropped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use image::RgbaImage;
use log::{debug, info};
use tempfile::TempDir;

use super::loader::{LoadError, Loader};
use super::timeline::{AnimationMode, Timeline};
use crate::config::Settings;
use crate::core::player::{Player, Tick};
use crate::pipeline::{self, ExportSummary, ImportOptions};

/// Answer of the discard-confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardDecision {
    /// Save first, continue only if saving succeeded
    Save,
    /// Drop unsaved changes
    Discard,
    /// Abort the destructive action
    Cancel,
}

/// Editing session
#[derive(Debug)]
pub struct Project {
    pub timeline: Timeline,
    pub player: Player,
    loader: Loader,
    /// Backing store for frames of the imported GIF
    import_dir: Option<TempDir>,
}

impl Default for Project {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl Project {
    pub fn new(settings: &Settings) -> Self {
        Self {
            timeline: Timeline::new(settings.default_duration_ms, settings.animation_mode),
            player: Player::new(),
            loader: Loader::with_vector_canvas(settings.vector_canvas()),
            import_dir: None,
        }
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Directory holding materialized import frames, if any
    pub fn import_dir(&self) -> Option<&Path> {
        self.import_dir.as_ref().map(TempDir::path)
    }

    /// `"<file name or Unsaved>"` plus `" (unsaved)"` when modified
    pub fn title(&self) -> String {
        let name = self
            .timeline
            .save_path()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unsaved".to_string());
        if self.timeline.is_modified() {
            format!("{} (unsaved)", name)
        } else {
            name
        }
    }

    // === Discard guard ===

    /// Ask before throwing away unsaved changes. Returns whether to proceed.
    pub fn confirm_discard(&mut self, decide: impl FnOnce() -> DiscardDecision) -> Result<bool> {
        if !self.timeline.is_modified() {
            return Ok(true);
        }
        match decide() {
            DiscardDecision::Save => {
                self.save()?;
                Ok(!self.timeline.is_modified())
            }
            DiscardDecision::Discard => Ok(true),
            DiscardDecision::Cancel => Ok(false),
        }
    }

    /// Replace the timeline with an empty one (keeps default duration and mode).
    pub fn new_project(&mut self, decide: impl FnOnce() -> DiscardDecision) -> Result<bool> {
        if !self.confirm_discard(decide)? {
            return Ok(false);
        }
        self.player.reset();
        self.timeline = Timeline::new(self.timeline.default_duration_ms(), self.timeline.animation_mode());
        self.import_dir = None;
        info!("New project");
        Ok(true)
    }

    // === Editing ===

    /// Append still images (named after their files) and start playback.
    pub fn add_images<P: AsRef<Path>>(&mut self, paths: &[P]) -> usize {
        for path in paths {
            let path = path.as_ref();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            self.timeline.add(path, name);
        }
        debug!("Added {} image(s), {} total", paths.len(), self.timeline.len());
        if !self.timeline.is_empty() && !self.player.is_playing() {
            self.player.start(&self.timeline);
        }
        paths.len()
    }

    /// Apply the default duration to every frame, unpinning all.
    pub fn overwrite_all_durations(&mut self) {
        let ms = self.timeline.default_duration_ms();
        self.timeline.force_uniform_duration(ms);
    }

    pub fn set_animation_mode(&mut self, mode: AnimationMode) {
        self.timeline.set_animation_mode(mode);
    }

    // === Playback ===

    pub fn toggle_play_pause(&mut self) -> Option<Duration> {
        self.player.toggle(&self.timeline)
    }

    pub fn tick(&mut self) -> Option<Tick> {
        self.player.tick(&mut self.timeline)
    }

    pub fn prev_frame(&mut self) -> Option<usize> {
        self.player.step_prev(&mut self.timeline)
    }

    pub fn next_frame(&mut self) -> Option<usize> {
        self.player.step_next(&mut self.timeline)
    }

    /// Pixels of the frame under the cursor at natural size.
    pub fn preview(&self) -> Option<Result<RgbaImage, LoadError>> {
        let frame = self.timeline.current()?;
        Some(self.loader.load(&frame.source, None))
    }

    // === Import / export ===

    /// Import an animated GIF, replacing the timeline. Starts playback.
    ///
    /// Returns `Ok(false)` if the discard guard cancelled. On error the current
    /// timeline is untouched.
    pub fn open_gif(&mut self, path: &Path, decide: impl FnOnce() -> DiscardDecision) -> Result<bool> {
        if !self.confirm_discard(decide)? {
            return Ok(false);
        }

        let dir = tempfile::Builder::new()
            .prefix("gifreel-frames-")
            .tempdir()
            .context("Failed to create frame directory")?;
        let options = ImportOptions {
            default_duration_ms: self.timeline.default_duration_ms(),
            animation_mode: self.timeline.animation_mode(),
        };
        let timeline = pipeline::import(path, dir.path(), options)
            .with_context(|| format!("Could not open GIF {}", path.display()))?;

        self.player.reset();
        self.timeline = timeline;
        self.import_dir = Some(dir);
        self.player.start(&self.timeline);
        Ok(true)
    }

    /// Export to the associated save location.
    pub fn save(&mut self) -> Result<ExportSummary> {
        let Some(path) = self.timeline.save_path().map(Path::to_path_buf) else {
            bail!("No save location; use save as");
        };
        self.save_to(&path)
    }

    /// Export to `path` (".gif" is enforced) and make it the save location.
    pub fn save_as(&mut self, path: &Path) -> Result<ExportSummary> {
        let path = with_gif_extension(path);
        self.save_to(&path)
    }

    fn save_to(&mut self, path: &Path) -> Result<ExportSummary> {
        let summary = pipeline::export(&mut self.timeline, path, &self.loader)
            .with_context(|| format!("Error saving GIF {}", path.display()))?;
        Ok(summary)
    }

    /// Write checked frames into `dir`. Returns the files written.
    pub fn export_checked(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let written = pipeline::export_checked(&self.timeline, dir, &self.loader)?;
        Ok(written)
    }
}

fn with_gif_extension(path: &Path) -> PathBuf {
    let is_gif = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gif"));
    if is_gif {
        path.to_path_buf()
    } else {
        path.with_extension("gif")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png(dir: &Path, name: &str, color: [u8; 4]) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(6, 6, Rgba(color)).save(&path).unwrap();
        path
    }

    fn never() -> DiscardDecision {
        panic!("discard prompt should not be shown")
    }

    /// Test: Adding images starts playback
    #[test]
    fn test_add_images_starts_playback() {
        let dir = tempfile::tempdir().unwrap();
        let a = png(dir.path(), "a.png", [255, 0, 0, 255]);
        let b = png(dir.path(), "b.png", [0, 255, 0, 255]);

        let mut project = Project::default();
        project.add_images(&[a, b]);

        assert_eq!(project.timeline.len(), 2);
        assert_eq!(project.timeline.get(1).unwrap().display_name, "b.png");
        assert!(project.player.is_playing());
        assert_eq!(project.title(), "Unsaved (unsaved)");
        assert_eq!(project.preview().unwrap().unwrap().dimensions(), (6, 6));
    }

    /// Test: Discard guard
    /// Validates: Cancel keeps frames, Discard clears, clean projects skip the prompt
    #[test]
    fn test_new_project_guard() {
        let mut project = Project::default();
        project.timeline.add("x.png", "x");

        assert!(!project.new_project(|| DiscardDecision::Cancel).unwrap());
        assert_eq!(project.timeline.len(), 1);

        assert!(project.new_project(|| DiscardDecision::Discard).unwrap());
        assert!(project.timeline.is_empty());
        assert!(!project.player.is_playing());

        assert!(project.new_project(never).unwrap());
    }

    /// Test: Save decision without a save location fails
    #[test]
    fn test_guard_save_without_location() {
        let mut project = Project::default();
        project.timeline.add("x.png", "x");
        assert!(project.new_project(|| DiscardDecision::Save).is_err());
        assert_eq!(project.timeline.len(), 1);
    }

    /// Test: Save as, then open
    /// Validates: Extension forced, save location set, import replaces timeline and cleans up
    #[test]
    fn test_save_as_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let a = png(dir.path(), "a.png", [255, 0, 0, 255]);
        let b = png(dir.path(), "b.png", [0, 0, 255, 255]);

        let mut project = Project::default();
        project.add_images(&[a, b]);
        project.timeline.set_duration(1, 300);

        let summary = project.save_as(&dir.path().join("anim")).unwrap();
        let saved = dir.path().join("anim.gif");
        assert_eq!(summary.path, saved);
        assert_eq!(project.title(), "anim.gif");

        // Edit then save in place
        project.timeline.toggle_checked(0);
        assert!(project.timeline.is_modified());
        project.save().unwrap();
        assert!(!project.timeline.is_modified());

        let mut other = Project::default();
        assert!(other.open_gif(&saved, never).unwrap());
        let first_dir = other.import_dir().unwrap().to_path_buf();
        assert!(first_dir.exists());
        assert_eq!(other.timeline.len(), 2);
        assert_eq!(other.timeline.get(1).unwrap().duration_ms, 300);
        assert!(other.timeline.get(1).unwrap().is_custom_duration);
        assert!(!other.timeline.is_modified());
        assert!(other.player.is_playing());

        assert!(other.open_gif(&saved, never).unwrap());
        assert!(!first_dir.exists());

        assert!(other.new_project(never).unwrap());
        assert!(other.import_dir().is_none());
    }

    /// Test: Failed open leaves the session alone
    #[test]
    fn test_open_broken_gif_keeps_timeline() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.gif");
        std::fs::write(&bad, b"nope").unwrap();

        let mut project = Project::default();
        project.timeline.add("x.png", "x");
        project.timeline.mark_saved();

        assert!(project.open_gif(&bad, never).is_err());
        assert_eq!(project.timeline.len(), 1);
        assert_eq!(project.timeline.get(0).unwrap().display_name, "x");
    }

    /// Test: Overwrite all durations with default
    #[test]
    fn test_overwrite_all_durations() {
        let mut project = Project::default();
        project.timeline.add("a.png", "a");
        project.timeline.add("b.png", "b");
        project.timeline.set_duration(0, 900);

        project.overwrite_all_durations();
        for f in project.timeline.frames() {
            assert_eq!(f.duration_ms, project.timeline.default_duration_ms());
            assert!(!f.is_custom_duration);
        }
    }

    /// Test: Manual stepping through the session
    #[test]
    fn test_prev_next() {
        let mut project = Project::default();
        project.timeline.add("a.png", "a");
        project.timeline.add("b.png", "b");
        project.toggle_play_pause();
        assert!(project.player.is_playing());

        assert_eq!(project.prev_frame(), Some(1));
        assert!(!project.player.is_playing());
        assert_eq!(project.next_frame(), Some(0));
        assert!(project.tick().is_none());
    }

    #[test]
    fn test_with_gif_extension() {
        assert_eq!(with_gif_extension(Path::new("a.GIF")), PathBuf::from("a.GIF"));
        assert_eq!(with_gif_extension(Path::new("a.png")), PathBuf::from("a.gif"));
        assert_eq!(with_gif_extension(Path::new("a")), PathBuf::from("a.gif"));
    }
}
