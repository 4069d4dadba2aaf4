use std::time::{Duration, Instant};

/// Gates sweep work to at most one tick per configured interval.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the sweep should advance at `now`. Paused ticks are never
    /// accepted and do not reset the interval.
    pub fn tick(&mut self, now: Instant, interval_millis: u64, paused: bool) -> bool {
        if paused {
            return false;
        }
        let due = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) > Duration::from_millis(interval_millis),
        };
        if due {
            self.last = Some(now);
        }
        due
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
