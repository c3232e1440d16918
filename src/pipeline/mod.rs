//! One-shot synchronous pipelines: GIF import, GIF export, frame export.

pub mod frame_export;
pub mod gif_export;
pub mod gif_import;

pub use frame_export::{export_checked, FrameExportError};
pub use gif_export::{export, write_gif, ExportError, ExportSummary};
pub use gif_import::{import, ImportError, ImportOptions};
