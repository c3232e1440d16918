//! Entities module - frame, timeline, raster loader and the editing session
//!
//! Data types carry no UI. Hosts render `Timeline::frames()` as rows, the
//! `Project::preview()` image as the viewer, and `Player::play_label()` on the
//! play/pause control.

pub mod frame;
pub mod loader;
pub mod project;
pub mod timeline;

pub use frame::Frame;
pub use loader::{LoadError, Loader, RasterSource, SourceKind};
pub use project::{DiscardDecision, Project};
pub use timeline::{AnimationMode, Timeline};
