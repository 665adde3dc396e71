//! Fixed-rate frame pacing.

use std::time::{Duration, Instant};

/// Sleeps away whatever is left of the current frame, like a game-loop clock.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame: Duration,
    last: Instant,
}

impl FrameClock {
    pub fn new(fps: f64) -> Self {
        Self {
            frame: Duration::from_secs_f64(1.0 / fps.max(1.0)),
            last: Instant::now(),
        }
    }

    /// Time left in the current frame as of `now`.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.frame
            .saturating_sub(now.saturating_duration_since(self.last))
    }

    /// Block until the frame is over. Returns the time since the previous tick.
    pub fn tick(&mut self) -> Duration {
        let wait = self.remaining(Instant::now());
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed
    }
}
