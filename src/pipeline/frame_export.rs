//! Export checked frames as individual image files
//!
//! Each checked frame is loaded at its natural size and written into the
//! target directory under its display name. Vector sources always become PNG;
//! raster sources keep the display name's format when it is a writable raster
//! extension, otherwise `.png` is appended.
//!
//! Display names need not be unique. Output names are claimed in timeline order
//! before any write, and a later frame whose name is taken gets `_2`, `_3`, ...
//! before the extension.
//!
//! Frames that fail to load (or to write) are skipped; the result is the number
//! of files actually written, which may be 0.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::entities::frame::Frame;
use crate::entities::loader::{RasterSource, SourceKind};
use crate::entities::timeline::Timeline;

#[derive(Debug, Error)]
pub enum FrameExportError {
    #[error("no checked frames to export")]
    NothingChecked,
    #[error("could not create {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write every checked frame of `timeline` into `dir`.
///
/// Checks the selection before touching the filesystem. Returns the paths written.
pub fn export_checked(timeline: &Timeline, dir: &Path, source: &impl RasterSource) -> Result<Vec<PathBuf>, FrameExportError> {
    let checked: Vec<&Frame> = timeline.frames().iter().filter(|f| f.is_checked).collect();
    if checked.is_empty() {
        return Err(FrameExportError::NothingChecked);
    }

    std::fs::create_dir_all(dir).map_err(|source| FrameExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let names = unique_output_names(&checked);
    let written: Vec<PathBuf> = checked
        .par_iter()
        .zip(names.par_iter())
        .filter_map(|(frame, (name, format))| write_frame(frame, &dir.join(name), *format, source))
        .collect();

    if written.is_empty() {
        warn!("None of the {} checked frame(s) could be exported", checked.len());
    }
    info!("Exported {} of {} frame(s) to {}", written.len(), checked.len(), dir.display());
    Ok(written)
}

/// Output file name per frame, distinct within one export.
fn unique_output_names(frames: &[&Frame]) -> Vec<(String, ImageFormat)> {
    // Lowercased so names differing only in case don't clobber on case-insensitive filesystems
    let mut taken = HashSet::new();
    frames
        .iter()
        .map(|frame| {
            let (name, format) = output_name(&frame.display_name, SourceKind::of(&frame.source));
            if taken.insert(name.to_lowercase()) {
                return (name, format);
            }

            let path = Path::new(&name);
            let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
            let renamed = (2..)
                .map(|n| match &ext {
                    Some(ext) => format!("{}_{}.{}", stem, n, ext),
                    None => format!("{}_{}", stem, n),
                })
                .find(|candidate| taken.insert(candidate.to_lowercase()))
                .unwrap_or(name);
            debug!("Output name '{}' already used, writing '{}'", frame.display_name, renamed);
            (renamed, format)
        })
        .collect()
}

fn write_frame(frame: &Frame, path: &Path, format: ImageFormat, source: &impl RasterSource) -> Option<PathBuf> {
    let img = match source.load(&frame.source, None) {
        Ok(img) => img,
        Err(e) => {
            warn!("Skipping '{}': {}", frame.display_name, e);
            return None;
        }
    };

    let img = DynamicImage::ImageRgba8(img);
    let img = if supports_alpha(format) {
        img
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    match img.save_with_format(path, format) {
        Ok(()) => {
            debug!("Wrote {}", path.display());
            Some(path.to_path_buf())
        }
        Err(e) => {
            warn!("Could not write {}: {}", path.display(), e);
            None
        }
    }
}

/// File name and encoder for a frame.
pub fn output_name(display_name: &str, kind: SourceKind) -> (String, ImageFormat) {
    let png = || {
        if display_name.to_lowercase().ends_with(".png") {
            display_name.to_string()
        } else {
            format!("{}.png", display_name)
        }
    };

    match kind {
        SourceKind::Vector => (png(), ImageFormat::Png),
        SourceKind::Raster => match ImageFormat::from_path(display_name) {
            Ok(format) if format.writing_enabled() => (display_name.to_string(), format),
            _ => (png(), ImageFormat::Png),
        },
    }
}

fn supports_alpha(format: ImageFormat) -> bool {
    !matches!(format, ImageFormat::Jpeg)
}
