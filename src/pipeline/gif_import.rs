//! Animated GIF import
//!
//! Decodes every sub-image of a GIF (composited to full-canvas RGBA by the
//! `image` decoder), materializes each as a standalone PNG in a caller-owned
//! directory and builds a fresh Timeline pointing at those files.
//!
//! # Duration post-pass
//!
//! - All frames share one duration: it becomes the new default and no frame is pinned.
//! - Otherwise the default is kept and a frame is pinned iff it differs from it.
//!
//! GIF delays are centiseconds; a zero delay is treated as "not specified"
//! and replaced by the default.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use log::{debug, info};
use thiserror::Error;

use crate::entities::frame::{clamp_duration, Frame};
use crate::entities::timeline::{AnimationMode, Timeline};

/// Import failure. The caller's existing Timeline is never touched.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not decode GIF {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("could not write frame {}: {source}", path.display())]
    Materialize {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Import options taken from the current session
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    /// Fallback for frames without a delay, and the default kept on mixed timing
    pub default_duration_ms: u32,
    pub animation_mode: AnimationMode,
}

/// Decode `path` into a new Timeline whose frames live in `frames_dir`.
///
/// The returned Timeline has its cursor at 0 (or none), `path` as save
/// location and no unsaved changes.
pub fn import(path: &Path, frames_dir: &Path, options: ImportOptions) -> Result<Timeline, ImportError> {
    info!("Importing GIF: {}", path.display());

    let decode_err = |source| ImportError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoder = GifDecoder::new(BufReader::new(file)).map_err(decode_err)?;
    let decoded = decoder.into_frames().collect_frames().map_err(decode_err)?;

    let base_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());

    let default_ms = clamp_duration(options.default_duration_ms);
    let mut timeline = Timeline::new(default_ms, options.animation_mode);
    let mut durations = Vec::with_capacity(decoded.len());

    for (i, sub) in decoded.into_iter().enumerate() {
        let duration = delay_to_ms(sub.delay()).unwrap_or(default_ms);
        let name = format!("{}_{:03}", base_name, i + 1);
        let frame_path = frames_dir.join(format!("{}.png", name));

        sub.into_buffer()
            .save(&frame_path)
            .map_err(|source| ImportError::Materialize {
                path: frame_path.clone(),
                source,
            })?;
        debug!("Materialized {} ({} ms)", frame_path.display(), duration);

        durations.push(duration);
        timeline.push(Frame::new(frame_path, name, duration));
    }

    apply_duration_policy(&mut timeline, &durations);

    timeline.set_save_path(Some(path.to_path_buf()));
    timeline.mark_saved();

    info!(
        "Imported {} frame(s) from {} (default {} ms)",
        timeline.len(),
        path.display(),
        timeline.default_duration_ms()
    );
    Ok(timeline)
}

/// GIF delay in ms, `None` when the file did not specify one.
fn delay_to_ms(delay: image::Delay) -> Option<u32> {
    let (numer, denom) = delay.numer_denom_ms();
    if numer == 0 || denom == 0 {
        return None;
    }
    Some(clamp_duration(((numer + denom / 2) / denom).max(1)))
}

fn apply_duration_policy(timeline: &mut Timeline, durations: &[u32]) {
    let uniform = durations
        .first()
        .filter(|first| durations.iter().all(|d| d == *first))
        .copied();

    match uniform {
        Some(ms) => {
            timeline.adopt_default_duration(ms);
            for frame in timeline.frames_mut() {
                frame.duration_ms = ms;
                frame.is_custom_duration = false;
            }
        }
        None => {
            let default = timeline.default_duration_ms();
            for frame in timeline.frames_mut() {
                frame.is_custom_duration = frame.duration_ms != default;
            }
        }
    }
}
