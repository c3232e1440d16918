//! GIFREEL - animated GIF frame editor library
//!
//! Re-exports all modules for use by the binary target.

// Core engine (player, host loop)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod entities;
pub mod pipeline;

// Re-export commonly used types from core
pub use crate::core::player::Player;

// Re-export entities
pub use entities::{AnimationMode, DiscardDecision, Frame, Loader, Project, Timeline};
