//! Sleep-driven host loop for the playback scheduler.
//!
//! Delivers ticks strictly sequentially on the calling thread: wait for the
//! delay the player asked for, tick, hand the new frame to the preview sink.

use std::thread;
use std::time::Duration;

use log::debug;

use crate::core::player::Player;
use crate::entities::frame::Frame;
use crate::entities::timeline::Timeline;

/// Receiver for "current frame changed" notifications
pub trait PreviewSink {
    fn show(&mut self, index: usize, frame: &Frame);
}

impl<F: FnMut(usize, &Frame)> PreviewSink for F {
    fn show(&mut self, index: usize, frame: &Frame) {
        self(index, frame)
    }
}

/// Time source for the loop; tests swap in one that does not sleep.
pub trait Clock {
    fn wait(&mut self, delay: Duration);
}

/// Real-time clock
pub struct SleepClock;

impl Clock for SleepClock {
    fn wait(&mut self, delay: Duration) {
        thread::sleep(delay);
    }
}

/// Play `timeline` for at most `max_ticks` ticks.
///
/// The sink sees the starting frame first, then every frame the player
/// advances to. Returns the number of ticks delivered.
pub fn run_playback(
    player: &mut Player,
    timeline: &mut Timeline,
    max_ticks: usize,
    clock: &mut impl Clock,
    sink: &mut impl PreviewSink,
) -> usize {
    let Some(mut delay) = player.start(timeline) else {
        debug!("Nothing to play");
        return 0;
    };

    if let (Some(index), Some(frame)) = (timeline.cursor(), timeline.current()) {
        sink.show(index, frame);
    }

    let mut delivered = 0;
    while delivered < max_ticks && player.is_playing() {
        clock.wait(delay);
        let Some(tick) = player.tick(timeline) else {
            break;
        };
        delivered += 1;
        if let Some(frame) = timeline.get(tick.index) {
            sink.show(tick.index, frame);
        }
        delay = tick.delay;
    }

    player.stop();
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::timeline::AnimationMode;

    #[derive(Default)]
    struct RecordingClock(Vec<Duration>);

    impl Clock for RecordingClock {
        fn wait(&mut self, delay: Duration) {
            self.0.push(delay);
        }
    }

    /// Test: Host loop delivers ticks with per-frame delays
    /// Validates: Waits use the duration of the frame currently on screen
    #[test]
    fn test_run_playback_waits_per_frame() {
        let mut tl = Timeline::new(100, AnimationMode::Wave);
        tl.add("a.png", "a");
        tl.add("b.png", "b");
        tl.set_duration(1, 300);

        let mut player = Player::new();
        let mut clock = RecordingClock::default();
        let mut shown = Vec::new();
        let mut sink = |i: usize, f: &Frame| shown.push((i, f.display_name.clone()));

        let ticks = run_playback(&mut player, &mut tl, 3, &mut clock, &mut sink);

        assert_eq!(ticks, 3);
        assert_eq!(
            clock.0,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(300),
                Duration::from_millis(100),
            ]
        );
        let indices: Vec<usize> = shown.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 0, 1]);
        assert!(!player.is_playing());
    }

    /// Test: Empty timeline never waits
    #[test]
    fn test_run_playback_empty() {
        let mut tl = Timeline::default();
        let mut player = Player::new();
        let mut clock = RecordingClock::default();
        let mut shown = 0;
        let mut sink = |_: usize, _: &Frame| shown += 1;

        assert_eq!(run_playback(&mut player, &mut tl, 5, &mut clock, &mut sink), 0);
        assert!(clock.0.is_empty());
        assert_eq!(shown, 0);
    }
}
