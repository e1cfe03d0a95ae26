//! Spin sequencing timeline
//!
//! A spin is a fixed schedule: reels start one after another, hold at full
//! speed, then stop in the same order. The timeline hands out commands as
//! their time comes due.

use crate::settings::SpinTiming;

/// A command for one reel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReelCommand {
    Start(usize),
    Stop(usize),
}

#[derive(Debug, Clone)]
pub struct SpinSequence {
    /// (due time in seconds, command), sorted by time
    steps: Vec<(f32, ReelCommand)>,
    next: usize,
    elapsed: f32,
    duration: f32,
}

impl SpinSequence {
    pub fn new(reel_count: usize, timing: &SpinTiming) -> Self {
        let start = timing.start_interval_ms / 1000.0;
        let hold = timing.hold_ms / 1000.0;
        let stop = timing.stop_interval_ms / 1000.0;
        let n = reel_count as f32;

        let starts = (0..reel_count).map(|i| (i as f32 * start, ReelCommand::Start(i)));
        let stops_begin = n * start + hold;
        let stops = (0..reel_count).map(|i| (stops_begin + i as f32 * stop, ReelCommand::Stop(i)));

        Self {
            steps: starts.chain(stops).collect(),
            next: 0,
            elapsed: 0.0,
            // Each command waits one interval after it is issued
            duration: stops_begin + n * stop,
        }
    }

    /// Advance by `dt` seconds and return every command now due
    pub fn advance(&mut self, dt: f32) -> Vec<ReelCommand> {
        self.elapsed += dt.max(0.0);
        let mut due = Vec::new();
        while let Some(&(at, command)) = self.steps.get(self.next) {
            if at > self.elapsed {
                break;
            }
            due.push(command);
            self.next += 1;
        }
        due
    }

    /// All commands issued and the trailing interval has elapsed
    pub fn is_complete(&self) -> bool {
        self.next == self.steps.len() && self.elapsed >= self.duration
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Total length of the schedule in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }
}
