//! Core engine modules - playback scheduler and its host loop
//!
//! These modules drive the timeline cursor, independent of any UI.

pub mod player;
pub mod runner;

pub use player::{PlaybackState, Player, Tick};
pub use runner::{run_playback, Clock, PreviewSink, SleepClock};
