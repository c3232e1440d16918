//! Animated GIF export
//!
//! Loads every frame of a Timeline at one canonical size and encodes the
//! result as a single looping GIF.
//!
//! # Pipeline
//!
//! 1. Empty timeline -> `EmptyTimeline`, nothing written.
//! 2. First frame at natural size defines the canonical size; failure ->
//!    `FirstFrameLoad`, nothing written.
//! 3. All frames (checked or not) are loaded at the canonical size in parallel;
//!    failures are dropped together with their duration.
//! 4. Nothing left -> `NoLoadableFrames`.
//! 5. Encode: infinite loop, per-frame delay in centiseconds, every frame
//!    disposed to background. Palette quantization is left to the `gif` crate.
//!
//! The GIF is written to a temporary file next to the destination and only
//! renamed over it once the encoder finished, so a failed export never leaves
//! a partial file behind.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::entities::loader::{LoadError, RasterSource};
use crate::entities::timeline::Timeline;

/// NeuQuant speed passed to the gif crate (1 = best, 30 = fastest)
const QUANTIZE_SPEED: i32 = 10;

/// Export failure. On any of these the destination is left untouched.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no frames to save")]
    EmptyTimeline,
    #[error("could not load first frame: {0}")]
    FirstFrameLoad(#[source] LoadError),
    #[error("no frames could be loaded for saving")]
    NoLoadableFrames,
    #[error("canvas {0}x{1} exceeds the GIF limit of 65535x65535")]
    TooLarge(u32, u32),
    #[error("GIF encoding failed: {0}")]
    Encode(#[from] gif::EncodingError),
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What ended up in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Frames written
    pub frames: usize,
    /// Frames dropped because their source failed to load
    pub dropped: usize,
}

/// Write `timeline` to `path` as an animated GIF.
///
/// Does not touch the timeline; see `Project::save_as` for the session update.
pub fn write_gif(timeline: &Timeline, path: &Path, source: &impl RasterSource) -> Result<ExportSummary, ExportError> {
    let first = timeline.get(0).ok_or(ExportError::EmptyTimeline)?;

    let canonical = source
        .load(&first.source, None)
        .map_err(ExportError::FirstFrameLoad)?
        .dimensions();
    let (width, height) = canonical;
    if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
        return Err(ExportError::TooLarge(width, height));
    }
    debug!("Canonical size {}x{} from {}", width, height, first.display_name);

    let loaded: Vec<Option<(RgbaImage, u32)>> = timeline
        .frames()
        .par_iter()
        .map(|frame| match source.load(&frame.source, Some(canonical)) {
            Ok(img) => Some((img, frame.duration_ms)),
            Err(e) => {
                warn!("Dropping frame '{}' from export: {}", frame.display_name, e);
                None
            }
        })
        .collect();

    let total = loaded.len();
    let frames: Vec<(RgbaImage, u32)> = loaded.into_iter().flatten().collect();
    if frames.is_empty() {
        return Err(ExportError::NoLoadableFrames);
    }
    let dropped = total - frames.len();

    encode_atomic(path, canonical, frames.iter().map(|(img, ms)| (img, *ms)))?;

    info!(
        "Saved {} frame(s) to {} ({}x{}, {} dropped)",
        frames.len(),
        path.display(),
        width,
        height,
        dropped
    );

    Ok(ExportSummary {
        path: path.to_path_buf(),
        width,
        height,
        frames: frames.len(),
        dropped,
    })
}

/// Export and, on success, make `path` the timeline's save location and clear
/// its unsaved-changes flag.
pub fn export(timeline: &mut Timeline, path: &Path, source: &impl RasterSource) -> Result<ExportSummary, ExportError> {
    let summary = write_gif(timeline, path, source)?;
    timeline.set_save_path(Some(path.to_path_buf()));
    timeline.mark_saved();
    Ok(summary)
}

/// Milliseconds to GIF centiseconds (rounded, at least 1).
pub fn ms_to_centis(ms: u32) -> u16 {
    ((ms + 5) / 10).clamp(1, u32::from(u16::MAX)) as u16
}

fn encode_atomic<'a>(
    path: &Path,
    (width, height): (u32, u32),
    frames: impl Iterator<Item = (&'a RgbaImage, u32)>,
) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::Builder::new()
        .prefix(".gifreel-")
        .suffix(".gif.tmp")
        .tempfile_in(dir)
        .map_err(io_err)?;

    {
        let file: &File = tmp.as_file();
        let mut encoder = gif::Encoder::new(BufWriter::new(file), width as u16, height as u16, &[])?;
        encoder.set_repeat(gif::Repeat::Infinite)?;

        for (img, ms) in frames {
            let mut pixels = img.as_raw().clone();
            let mut frame = gif::Frame::from_rgba_speed(width as u16, height as u16, &mut pixels, QUANTIZE_SPEED);
            frame.delay = ms_to_centis(ms);
            frame.dispose = gif::DisposalMethod::Background;
            encoder.write_frame(&frame)?;
        }

        let mut writer = encoder.into_inner().map_err(io_err)?;
        writer.flush().map_err(io_err)?;
    }

    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
