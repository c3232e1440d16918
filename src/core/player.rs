//! Playback scheduler with per-frame timing and loop / wave modes
//!
//! **Architecture**: Player does NOT own the Timeline. It receives
//! `&Timeline` / `&mut Timeline` when it needs frame data and only ever
//! writes the cursor. The Timeline is the single source of truth.
//!
//! # Timing Model
//!
//! Duration-based: every frame is shown for its own `duration_ms`. After each
//! advance the delay is re-read from the *new* current frame, so a frame is
//! never shown for its predecessor's time. Delays are floored at 10 ms.
//!
//! # Scheduling
//!
//! The player never sleeps. `start()` and `tick()` return the delay after which
//! the host should deliver the next tick; `update()` is the polling variant for
//! hosts with a fixed-rate loop (compares against a stored deadline).
//!
//! # Modes
//!
//! - **Loop**: `next = (i + 1) mod n`
//! - **Wave**: ping-pong; the direction flips only at the two endpoints
//!
//! Manual stepping (`step_prev` / `step_next`) stops playback and wraps
//! modulo n in both modes.

use std::time::{Duration, Instant};

use log::{info, trace};

use crate::entities::frame::MIN_DURATION_MS;
use crate::entities::timeline::{AnimationMode, Timeline};

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Result of one automatic advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// New cursor (already written to the timeline)
    pub index: usize,
    /// Delay until the next tick should fire
    pub delay: Duration,
}

/// Playback state manager (does NOT own the Timeline)
#[derive(Debug, Clone)]
pub struct Player {
    state: PlaybackState,
    /// +1 or -1, only meaningful in wave mode
    wave_direction: i32,
    /// Deadline of the pending tick (runtime-only)
    next_tick_at: Option<Instant>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
            wave_direction: 1,
            next_tick_at: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn wave_direction(&self) -> i32 {
        self.wave_direction
    }

    /// Label for a play/pause control
    pub fn play_label(&self) -> &'static str {
        if self.is_playing() { "Pause" } else { "Play" }
    }

    /// Delay the current frame should stay on screen.
    ///
    /// Falls back to the default duration when there is no cursor.
    pub fn current_delay(timeline: &Timeline) -> Duration {
        let ms = timeline
            .current()
            .map(|f| f.duration_ms)
            .unwrap_or_else(|| timeline.default_duration_ms());
        Duration::from_millis(u64::from(ms.max(MIN_DURATION_MS)))
    }

    /// Stopped -> Playing. Returns the delay of the first tick.
    ///
    /// No-op (returns `None`) on an empty timeline. Starting while already
    /// playing re-arms the pending tick.
    pub fn start(&mut self, timeline: &Timeline) -> Option<Duration> {
        if timeline.is_empty() {
            return None;
        }
        let delay = Self::current_delay(timeline);
        self.state = PlaybackState::Playing;
        self.next_tick_at = Some(Instant::now() + delay);
        trace!("Playback started, first tick in {:?}", delay);
        Some(delay)
    }

    /// Playing -> Stopped; cancels the pending tick.
    pub fn stop(&mut self) {
        if self.is_playing() {
            trace!("Playback stopped");
        }
        self.state = PlaybackState::Stopped;
        self.next_tick_at = None;
    }

    /// Play/pause toggle. Returns the first delay when playback started.
    pub fn toggle(&mut self, timeline: &Timeline) -> Option<Duration> {
        if self.is_playing() {
            self.stop();
            None
        } else {
            self.start(timeline)
        }
    }

    /// Advance the cursor by one step of the current mode.
    ///
    /// Only acts while playing. Stops playback if the timeline became empty.
    pub fn tick(&mut self, timeline: &mut Timeline) -> Option<Tick> {
        if !self.is_playing() {
            return None;
        }
        if timeline.is_empty() {
            self.stop();
            return None;
        }

        let next = self.next_index(timeline);
        timeline.set_cursor(next);
        let delay = Self::current_delay(timeline);
        self.next_tick_at = Some(Instant::now() + delay);
        trace!("Tick -> frame {} (next in {:?})", next, delay);
        Some(Tick { index: next, delay })
    }

    /// Polling variant of `tick`: fires once the pending deadline has passed.
    ///
    /// Returns the new cursor if the frame changed.
    pub fn update(&mut self, timeline: &mut Timeline, now: Instant) -> Option<usize> {
        match self.next_tick_at {
            Some(deadline) if self.is_playing() && now >= deadline => {
                self.tick(timeline).map(|t| t.index)
            }
            _ => None,
        }
    }

    /// Compute the next cursor for the timeline's animation mode.
    ///
    /// Wave mode persists its direction in `self`.
    fn next_index(&mut self, timeline: &Timeline) -> usize {
        let n = timeline.len();
        let i = timeline.cursor().unwrap_or(0);
        if n <= 1 {
            return 0;
        }

        match timeline.animation_mode() {
            AnimationMode::Loop => (i + 1) % n,
            AnimationMode::Wave => {
                if i == 0 {
                    self.wave_direction = 1;
                } else if i >= n - 1 {
                    self.wave_direction = -1;
                }
                let next = i as i64 + i64::from(self.wave_direction);
                next.clamp(0, n as i64 - 1) as usize
            }
        }
    }

    /// Manual step back: stops playback, wraps to the last frame.
    pub fn step_prev(&mut self, timeline: &mut Timeline) -> Option<usize> {
        self.step(timeline, -1)
    }

    /// Manual step forward: stops playback, wraps to the first frame.
    pub fn step_next(&mut self, timeline: &mut Timeline) -> Option<usize> {
        self.step(timeline, 1)
    }

    fn step(&mut self, timeline: &mut Timeline, delta: i64) -> Option<usize> {
        if timeline.is_empty() {
            return None;
        }
        self.stop();
        let n = timeline.len() as i64;
        let i = timeline.cursor().unwrap_or(0) as i64;
        let target = (i + delta).rem_euclid(n) as usize;
        timeline.set_cursor(target);
        trace!("Manual step -> frame {}", target);
        Some(target)
    }

    /// Reset direction and stop (new project / fresh import)
    pub fn reset(&mut self) {
        self.stop();
        self.wave_direction = 1;
        info!("Player reset");
    }
}
