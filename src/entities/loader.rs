//! Raster loader with raster and vector backends
//!
//! Resolves a frame source into a straight-alpha RGBA8 buffer, optionally
//! resized to a target size. The backend is picked once per load from the
//! file extension:
//! - `SourceKind::Vector` (SVG): rasterized with `resvg` directly at the target
//!   size (or the default canvas) onto a transparent background
//! - `SourceKind::Raster` (PNG, JPEG, GIF, BMP, ...): decoded with `image`
//!
//! Resampling always uses Lanczos3; there is no nearest-neighbour path.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{ImageReader, RgbaImage};
use log::debug;
use resvg::{tiny_skia, usvg};
use thiserror::Error;

/// Canvas used for vector sources when no target size is requested
pub const DEFAULT_VECTOR_CANVAS: (u32, u32) = (512, 512);

/// Frame-level load failure. Callers usually skip the frame.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot rasterize {}: {message}", path.display())]
    Vector { path: PathBuf, message: String },
}

/// How a source is turned into pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Raster,
    Vector,
}

impl SourceKind {
    /// Classify by extension (case-insensitive).
    pub fn of(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "svg" | "svgz" => SourceKind::Vector,
            _ => SourceKind::Raster,
        }
    }
}

/// Anything that can resolve a frame source into pixels.
///
/// Pipelines load through this seam; `Loader` is the file-backed implementation.
pub trait RasterSource: Sync {
    fn load(&self, source: &Path, target: Option<(u32, u32)>) -> Result<RgbaImage, LoadError>;
}

/// File-backed raster loader
#[derive(Debug, Clone, Copy)]
pub struct Loader {
    /// Canvas for vector sources loaded without a target size
    pub vector_canvas: (u32, u32),
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            vector_canvas: DEFAULT_VECTOR_CANVAS,
        }
    }
}

impl Loader {
    pub fn with_vector_canvas(vector_canvas: (u32, u32)) -> Self {
        Self { vector_canvas }
    }

    /// Load `source`, resized to `target` when given.
    pub fn load(&self, source: &Path, target: Option<(u32, u32)>) -> Result<RgbaImage, LoadError> {
        if !source.is_file() {
            return Err(LoadError::Missing(source.to_path_buf()));
        }

        match SourceKind::of(source) {
            SourceKind::Vector => {
                let size = target.unwrap_or(self.vector_canvas);
                Self::load_vector(source, size)
            }
            SourceKind::Raster => {
                let img = Self::load_raster(source)?;
                Ok(match target {
                    Some(size) => resample(img, size),
                    None => img,
                })
            }
        }
    }

    fn load_raster(path: &Path) -> Result<RgbaImage, LoadError> {
        debug!("Loading raster image: {}", path.display());

        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Format comes from the content, not the extension
        let img = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(io_err)?
            .decode()
            .map_err(|e| match e {
                image::ImageError::IoError(source) => io_err(source),
                source => LoadError::Decode {
                    path: path.to_path_buf(),
                    source,
                },
            })?;

        Ok(img.to_rgba8())
    }

    fn load_vector(path: &Path, (width, height): (u32, u32)) -> Result<RgbaImage, LoadError> {
        debug!("Rasterizing vector image {} at {}x{}", path.display(), width, height);

        let vector_err = |message: String| LoadError::Vector {
            path: path.to_path_buf(),
            message,
        };

        let data = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut options = usvg::Options::default();
        options.resources_dir = path.parent().map(Path::to_path_buf);
        let tree = usvg::Tree::from_data(&data, &options).map_err(|e| vector_err(e.to_string()))?;

        let mut pixmap = tiny_skia::Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| vector_err(format!("invalid canvas {}x{}", width, height)))?;

        // Stretch the document onto the whole canvas
        let doc = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            pixmap.width() as f32 / doc.width(),
            pixmap.height() as f32 / doc.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        // tiny-skia stores premultiplied alpha
        let mut straight = Vec::with_capacity(pixmap.pixels().len() * 4);
        for px in pixmap.pixels() {
            let c = px.demultiply();
            straight.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        RgbaImage::from_raw(pixmap.width(), pixmap.height(), straight)
            .ok_or_else(|| vector_err("pixel buffer size mismatch".to_string()))
    }
}

impl RasterSource for Loader {
    fn load(&self, source: &Path, target: Option<(u32, u32)>) -> Result<RgbaImage, LoadError> {
        Loader::load(self, source, target)
    }
}

/// Resize to `size` with Lanczos3 unless it already matches.
pub fn resample(img: RgbaImage, (width, height): (u32, u32)) -> RgbaImage {
    if img.dimensions() == (width, height) || width == 0 || height == 0 {
        return img;
    }
    image::imageops::resize(&img, width, height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const SQUARE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10">
  <rect x="0" y="0" width="5" height="10" fill="#ff0000"/>
</svg>"##;

    /// Test: Source kind dispatch
    #[test]
    fn test_source_kind() {
        assert_eq!(SourceKind::of(Path::new("a.svg")), SourceKind::Vector);
        assert_eq!(SourceKind::of(Path::new("A.SVG")), SourceKind::Vector);
        assert_eq!(SourceKind::of(Path::new("a.png")), SourceKind::Raster);
        assert_eq!(SourceKind::of(Path::new("noext")), SourceKind::Raster);
    }

    /// Test: Missing file
    /// Validates: Returns LoadError::Missing instead of panicking
    #[test]
    fn test_load_missing_file() {
        let result = Loader::default().load(Path::new("/nonexistent/path/frame.png"), None);
        assert!(matches!(result, Err(LoadError::Missing(_))));
    }

    /// Test: Undecodable file
    #[test]
    fn test_load_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let result = Loader::default().load(&path, None);
        assert!(matches!(result, Err(LoadError::Decode { .. })));
    }

    /// Test: Raster natural size and resize
    /// Validates: None keeps natural size, Some resamples, RGB becomes opaque RGBA
    #[test]
    fn test_load_raster_natural_and_resized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        image::RgbImage::from_pixel(8, 4, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let loader = Loader::default();
        let natural = loader.load(&path, None).unwrap();
        assert_eq!(natural.dimensions(), (8, 4));
        assert_eq!(natural.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));

        let resized = loader.load(&path, Some((16, 16))).unwrap();
        assert_eq!(resized.dimensions(), (16, 16));
    }

    /// Test: Raster format sniffed from content
    /// Validates: PNG without extension or named .jpg still loads
    #[test]
    fn test_load_raster_ignores_extension() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("shot.png");
        RgbaImage::from_pixel(5, 3, Rgba([200, 100, 50, 255])).save(&png).unwrap();

        let loader = Loader::default();
        for name in ["shot", "shot.jpg"] {
            let renamed = dir.path().join(name);
            std::fs::copy(&png, &renamed).unwrap();

            let img = loader.load(&renamed, None).unwrap();
            assert_eq!(img.dimensions(), (5, 3));
            assert_eq!(img.get_pixel(4, 2), &Rgba([200, 100, 50, 255]));
        }
    }

    /// Test: Vector rasterization
    /// Validates: Default canvas, explicit target, transparent background
    #[test]
    fn test_load_vector() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("half.svg");
        std::fs::write(&path, SQUARE_SVG).unwrap();

        let loader = Loader::with_vector_canvas((20, 20));
        let img = loader.load(&path, None).unwrap();
        assert_eq!(img.dimensions(), (20, 20));

        // Left half red, right half untouched (transparent)
        assert_eq!(img.get_pixel(2, 10), &Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(17, 10)[3], 0);

        let img = loader.load(&path, Some((40, 10))).unwrap();
        assert_eq!(img.dimensions(), (40, 10));
        assert_eq!(img.get_pixel(5, 5), &Rgba([255, 0, 0, 255]));
    }

    /// Test: Resample is a no-op at matching size
    #[test]
    fn test_resample_same_size() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 4]));
        let out = resample(img.clone(), (3, 3));
        assert_eq!(out, img);
    }
}
