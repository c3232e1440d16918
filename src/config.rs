//! Application paths and persisted settings.
//!
//! Paths resolve in this order:
//! 1. `--config-dir` CLI argument
//! 2. `GIFREEL_CONFIG_DIR` environment variable
//! 3. Current folder IF it already holds gifreel files (gifreel.json, gifreel.log)
//! 4. Platform directory from dirs-next
//!
//! Settings live in `gifreel.json`. A missing or broken file yields defaults.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::entities::frame::clamp_duration;
use crate::entities::loader::DEFAULT_VECTOR_CANVAS;
use crate::entities::timeline::{AnimationMode, DEFAULT_DURATION_MS};

/// Settings file name
pub const SETTINGS_FILE: &str = "gifreel.json";

/// Default log file name
pub const LOG_FILE: &str = "gifreel.log";

const APP_DIR: &str = "gifreel";
const CONFIG_DIR_ENV: &str = "GIFREEL_CONFIG_DIR";

/// Configuration for overriding default application paths
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var (GIFREEL_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }
}

/// Path to a configuration file
///
/// - Linux: ~/.config/gifreel/{name}
/// - macOS: ~/Library/Application Support/gifreel/{name}
/// - Windows: %APPDATA%\gifreel\{name}
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

/// Path to a data file (logs)
///
/// - Linux: ~/.local/share/gifreel/{name}
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    get_data_dir(config).join(name)
}

/// Create config and data directories if missing
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = get_config_dir(config);
    let data_dir = get_data_dir(config);

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    }

    if data_dir != config_dir && !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }

    Ok(())
}

fn has_local_config_files(dir: &Path) -> bool {
    [SETTINGS_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, platform: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir()
        && has_local_config_files(&current_dir)
    {
        return current_dir;
    }

    platform
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn get_config_dir(config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir())
}

fn get_data_dir(config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir())
}

/// Persisted editor preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Duration for newly added frames (ms)
    pub default_duration_ms: u32,
    pub animation_mode: AnimationMode,
    /// Canvas for vector frames loaded without a target size
    pub vector_canvas: [u32; 2],
    /// Where `split` writes when no output directory is given
    pub last_export_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_duration_ms: DEFAULT_DURATION_MS,
            animation_mode: AnimationMode::Loop,
            vector_canvas: [DEFAULT_VECTOR_CANVAS.0, DEFAULT_VECTOR_CANVAS.1],
            last_export_dir: None,
        }
    }
}

impl Settings {
    /// Load from `path`, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                debug!("No settings at {} ({}), using defaults", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str::<Settings>(&json) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                warn!("Ignoring unreadable settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write as pretty JSON, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Serialize settings")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Clamp values into their valid ranges.
    pub fn sanitized(mut self) -> Self {
        self.default_duration_ms = clamp_duration(self.default_duration_ms);
        if self.vector_canvas.contains(&0) {
            self.vector_canvas = [DEFAULT_VECTOR_CANVAS.0, DEFAULT_VECTOR_CANVAS.1];
        }
        self
    }

    pub fn vector_canvas(&self) -> (u32, u32) {
        (self.vector_canvas[0], self.vector_canvas[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };

        assert_eq!(config_file("test.json", &config), PathBuf::from("/custom/test.json"));
        assert_eq!(data_file("gifreel.log", &config), PathBuf::from("/custom/gifreel.log"));
    }

    #[test]
    fn test_cli_dir_wins_over_env() {
        let config = PathConfig::from_env_and_cli(Some(PathBuf::from("/from/cli")));
        assert_eq!(config.config_dir, Some(PathBuf::from("/from/cli")));
    }

    /// Test: Settings round-trip through JSON
    #[test]
    fn test_settings_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        let settings = Settings {
            default_duration_ms: 250,
            animation_mode: AnimationMode::Wave,
            last_export_dir: Some(PathBuf::from("/tmp/out")),
            ..Settings::default()
        };
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path), settings);
    }

    /// Test: Missing, broken and partial settings files
    /// Validates: Defaults fill gaps, values are clamped
    #[test]
    fn test_settings_fallbacks() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(Settings::load(&dir.path().join("missing.json")), Settings::default());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert_eq!(Settings::load(&broken), Settings::default());

        let partial = dir.path().join("partial.json");
        std::fs::write(&partial, r#"{"default_duration_ms": 1, "vector_canvas": [0, 10], "animation_mode": "wave"}"#).unwrap();
        let s = Settings::load(&partial);
        assert_eq!(s.default_duration_ms, 10);
        assert_eq!(s.vector_canvas(), DEFAULT_VECTOR_CANVAS);
        assert_eq!(s.animation_mode, AnimationMode::Wave);
    }
}
